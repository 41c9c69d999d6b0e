//! Disc and track structure inference over ordered text lines.
//!
//! Disc boundaries come from explicit headers (`CD 2`, `Disc 3`, `2:`)
//! or, failing that, from a track number dropping back to 1. Lines are
//! never reordered or rejected; each is only classified and assigned.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::unwrap_used)]
static DISC_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:(?:cd|disc|disk)\s*(\d+)\b.*|(\d+):\s*)$").unwrap()
});

#[allow(clippy::unwrap_used)]
static TRACK_LINE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"^\s*(\d+)\.\s*(\S.*)$").unwrap(),
        Regex::new(r"(?i)^\s*track\s+(\d+)[\s:]\s*(.*)$").unwrap(),
        Regex::new(r"^\s*(\d+)\s+(\p{Lu}.*)$").unwrap(),
        Regex::new(r"^\s*[\u{B7}\u{2022}]\s*(\d+)\s+(.+)$").unwrap(),
    ]
});

/// How a single line was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    DiscHeader { disc: u32 },
    Track { number: u32 },
    /// Neither a header nor a track ("not-a-track").
    Other,
}

/// One analyzed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInfo {
    pub index: usize,
    pub disc: u32,
    pub kind: LineKind,
}

impl LineInfo {
    #[must_use]
    pub const fn is_track(&self) -> bool {
        matches!(self.kind, LineKind::Track { .. })
    }
}

/// Result of [`analyze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscLayout {
    pub disc_count: u32,
    pub lines: Vec<LineInfo>,
    /// Number of times a track number reset to 1 opened a new disc.
    pub resets: u32,
}

impl DiscLayout {
    /// Disc assigned to the line at `index`, if that line exists.
    #[must_use]
    pub fn disc_of(&self, index: usize) -> Option<u32> {
        self.lines.get(index).map(|l| l.disc)
    }
}

/// Classify one line.
pub fn classify(line: &str) -> LineKind {
    if let Some(caps) = DISC_HEADER.captures(line) {
        let number = caps
            .get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|n| *n > 0);
        if let Some(disc) = number {
            return LineKind::DiscHeader { disc };
        }
    }
    for pattern in TRACK_LINE.iter() {
        if let Some(number) = pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|n| *n > 0)
        {
            return LineKind::Track { number };
        }
    }
    LineKind::Other
}

/// Assign every line to a disc and count the discs.
pub fn analyze<S: AsRef<str>>(lines: &[S]) -> DiscLayout {
    let mut current_disc = 1;
    let mut last_track = 0;
    let mut max_disc = 1;
    let mut resets = 0;
    let mut infos = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        let kind = classify(line.as_ref());
        match kind {
            LineKind::DiscHeader { disc } => {
                current_disc = disc;
                max_disc = max_disc.max(disc);
                last_track = 0;
            }
            LineKind::Track { number } => {
                if number == 1 && last_track > 1 {
                    current_disc += 1;
                    max_disc = max_disc.max(current_disc);
                    resets += 1;
                    log::debug!("track number reset at line {index}, now on disc {current_disc}");
                }
                last_track = number;
            }
            LineKind::Other => {}
        }
        infos.push(LineInfo {
            index,
            disc: current_disc,
            kind,
        });
    }

    DiscLayout {
        disc_count: max_disc,
        lines: infos,
        resets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_disc_headers() {
        assert_eq!(classify("CD 2"), LineKind::DiscHeader { disc: 2 });
        assert_eq!(classify("disc3"), LineKind::DiscHeader { disc: 3 });
        assert_eq!(classify("Disk 1 - Matthäus-Passion"), LineKind::DiscHeader { disc: 1 });
        assert_eq!(classify("2:"), LineKind::DiscHeader { disc: 2 });
        assert_eq!(classify("CD 0"), LineKind::Other);
    }

    #[test]
    fn test_classify_track_lines() {
        assert_eq!(classify("1. Aria"), LineKind::Track { number: 1 });
        assert_eq!(classify("Track 12: Variatio 11"), LineKind::Track { number: 12 });
        assert_eq!(classify("3 Allegro"), LineKind::Track { number: 3 });
        assert_eq!(classify("\u{B7} 4 andante"), LineKind::Track { number: 4 });
        assert_eq!(classify("3 allegro"), LineKind::Other);
        assert_eq!(classify("Performed by the Hilliard Ensemble"), LineKind::Other);
    }

    #[test]
    fn test_empty_input_is_one_disc() {
        let layout = analyze::<&str>(&[]);
        assert_eq!(layout.disc_count, 1);
        assert!(layout.lines.is_empty());
    }

    #[test]
    fn test_track_number_reset_opens_new_disc() {
        let layout = analyze(&["1. A", "2. B", "3. C", "1. D", "2. E"]);
        assert_eq!(layout.disc_count, 2);
        let discs: Vec<u32> = layout.lines.iter().map(|l| l.disc).collect();
        assert_eq!(discs, vec![1, 1, 1, 2, 2]);
        assert_eq!(layout.resets, 1);
    }

    #[test]
    fn test_headers_reset_track_counter() {
        let layout = analyze(&["CD 1", "1. A", "2. B", "CD 2", "1. C", "2. D"]);
        assert_eq!(layout.disc_count, 2);
        assert_eq!(layout.disc_of(4), Some(2));
        assert_eq!(layout.resets, 0);
    }

    #[test]
    fn test_other_lines_follow_current_disc() {
        let layout = analyze(&["1. A", "2. B", "notes", "1. C"]);
        assert_eq!(layout.lines[2].kind, LineKind::Other);
        assert!(!layout.lines[2].is_track());
        assert_eq!(layout.lines[2].disc, 1);
        assert_eq!(layout.disc_of(3), Some(2));
    }
}
