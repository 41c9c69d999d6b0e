//! Discogs release pages.
//!
//! Album fields come from the JSON-LD release schema, performer roles
//! from the `releaseCredits` array embedded in the page state (or the
//! rendered credits list when that is missing), and tracks from the
//! tracklist table. Multi-movement works appear as a heading row followed
//! by subtrack rows; they are flattened into `Parent: Movement` titles.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use partitura_core::model::{Album, Artist, Edition, Role, Track};
use partitura_core::names::{canonicalize, dedup_artists, dedup_names};
use partitura_core::normalize::{missing_composer, missing_title, missing_year};
use partitura_core::roles::{infer, infer_from_name, Confidence, Inference};
use partitura_core::structure::{analyze, classify, LineKind};
use partitura_core::text::{clean, fix_shouting, normalize_whitespace};
use partitura_core::{ExtractionResult, FieldError};

use super::first_year;
use super::markup::{Document, Element};
use crate::draft::Draft;
use crate::error::{ExtractError, ExtractResult};

/// Source label recorded on Discogs-built results.
pub const SOURCE: &str = "discogs";

const CREDITS_KEY: &str = "\"releaseCredits\"";

/// Credit roles describing production work rather than performance.
const PRODUCTION_CREDITS: &[&str] = &[
    "producer",
    "produced",
    "engineer",
    "mastered",
    "mastering",
    "lacquer",
    "recorded",
    "recording",
    "mixed",
    "mixing",
    "edited",
    "liner notes",
    "artwork",
    "design",
    "layout",
    "photography",
    "photo",
    "composed",
    "written",
    "lyrics",
    "libretto",
    "translated",
    "a&r",
];

#[allow(clippy::unwrap_used)]
static DISC_TRACK_POSITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:cd|disc|disk)?\s*(\d+)-(\d+)\s*$").unwrap());

#[allow(clippy::unwrap_used)]
static NAME_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\(\d+\)\s*$").unwrap());

/// A performer credit: a name and the free-text role Discogs gives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credit {
    pub name: String,
    pub role: String,
}

impl Credit {
    fn new(name: &str, role: &str) -> Self {
        Self {
            name: artist_name(name),
            role: normalize_whitespace(role),
        }
    }

    fn is_production(&self) -> bool {
        is_production_role(&self.role)
    }
}

/// Build a draft album from a Discogs release page.
pub fn extract(body: &str) -> ExtractResult<ExtractionResult> {
    let doc = Document::parse(body);
    let mut draft = Draft::default();
    let mut album = Album::default();

    let schema = release_schema(&doc)?;
    let mut performer_names = Vec::new();
    match &schema {
        Some(schema) => {
            apply_schema(schema, &mut album);
            performer_names = by_artist_names(schema);
        }
        None => {
            draft.warn("no JSON-LD release schema; album fields read from page markup");
            if let Some(title) = fallback_title(&doc) {
                album.title = title;
            }
        }
    }
    if !album.has_title() {
        draft.error(missing_title());
    }
    if album.original_year == 0 {
        draft.error(missing_year());
    }

    let mut credits = release_credits(body, &mut draft);
    if credits.is_empty() {
        credits = html_credits(&doc);
        if !credits.is_empty() {
            draft.note(format!("{} credits read from the credits section", credits.len()));
        }
    }

    album.album_artist = album_performers(&performer_names, &credits, &mut draft);
    album.tracks = tracks(&doc, &mut draft)?;

    log::info!(
        "discogs: '{}' with {} tracks and {} performers",
        album.title,
        album.tracks.len(),
        album.album_artist.len()
    );
    Ok(draft.finish(album, SOURCE))
}

// ---------------------------------------------------------------------------
// JSON-LD
// ---------------------------------------------------------------------------

fn release_schema(doc: &Document<'_>) -> ExtractResult<Option<Value>> {
    let Some(script) = doc.select_first("script#release_schema") else {
        log::warn!("discogs: release_schema script not found");
        return Ok(None);
    };
    let value: Value = serde_json::from_str(script.inner_html().trim())
        .map_err(|e| ExtractError::parse(SOURCE, format!("malformed JSON-LD: {e}")))?;
    if !value.is_object() {
        return Err(ExtractError::parse(SOURCE, "JSON-LD release schema is not an object"));
    }
    Ok(Some(value))
}

fn apply_schema(schema: &Value, album: &mut Album) {
    if let Some(name) = schema["name"].as_str().map(clean).filter(|n| !n.is_empty()) {
        album.title = name;
    }

    album.original_year = match &schema["datePublished"] {
        Value::Number(n) => n.as_u64().and_then(|y| u32::try_from(y).ok()).unwrap_or(0),
        Value::String(s) => first_year(s).unwrap_or(0),
        _ => 0,
    };

    let catalog = schema["catalogNumber"].as_str().map(clean).unwrap_or_default();
    let label = match &schema["recordLabel"] {
        Value::Array(labels) => labels.first().and_then(|l| l["name"].as_str()),
        other => other["name"].as_str(),
    }
    .map(clean)
    .unwrap_or_default();

    if !label.is_empty() || !catalog.is_empty() {
        album.edition = Some(Edition::new(label, catalog, album.original_year));
    }
}

fn by_artist_names(schema: &Value) -> Vec<String> {
    let by_artist = &schema["releaseOf"]["byArtist"];
    let artists: Vec<&Value> = match by_artist {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![by_artist],
        _ => Vec::new(),
    };
    artists
        .into_iter()
        .filter_map(|a| a["name"].as_str())
        .map(artist_name)
        .filter(|n| !n.is_empty())
        .collect()
}

fn fallback_title(doc: &Document<'_>) -> Option<String> {
    doc.select_first("h1")
        .map(|h| h.text())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            doc.select_first("title")
                .map(|t| t.text().split(" | ").next().unwrap_or_default().trim().to_string())
                .filter(|t| !t.is_empty())
        })
}

/// Strip Discogs disambiguation suffixes (`Name (2)`, `Name*`) and
/// title-case shouted names.
fn artist_name(raw: &str) -> String {
    let name = clean(raw);
    let name = NAME_SUFFIX.replace(&name, "");
    fix_shouting(name.trim_end_matches('*').trim())
}

// ---------------------------------------------------------------------------
// Credits
// ---------------------------------------------------------------------------

/// Find the JSON array following `key` and return it, brackets included.
///
/// Bracket depth is only counted outside string literals; a backslash
/// escapes the next character. Unicode escapes need no special handling
/// because they cannot contain a quote or a bracket.
pub fn find_json_array<'a>(haystack: &'a str, key: &str) -> Option<&'a str> {
    let key_at = haystack.find(key)?;
    let after_key = &haystack[key_at + key.len()..];
    let colon = after_key.trim_start().strip_prefix(':')?;
    let array = colon.trim_start();
    if !array.starts_with('[') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in array.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&array[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn release_credits(body: &str, draft: &mut Draft) -> Vec<Credit> {
    let Some(raw) = find_json_array(body, CREDITS_KEY) else {
        return Vec::new();
    };
    let entries: Vec<Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            draft.warn(format!("releaseCredits array could not be parsed: {e}"));
            return Vec::new();
        }
    };

    let mut credits = Vec::new();
    for entry in &entries {
        let role = entry["creditRole"].as_str().unwrap_or_default();
        for key in ["displayName", "nameVariation"] {
            if let Some(name) = entry[key].as_str().filter(|n| !n.trim().is_empty()) {
                credits.push(Credit::new(name, role));
            }
        }
    }
    log::debug!("discogs: {} release credits", credits.len());
    credits
}

/// Credits from the rendered page: list items under a "Credits" heading,
/// then two-cell table rows outside the tracklist.
fn html_credits(doc: &Document<'_>) -> Vec<Credit> {
    let mut credits = Vec::new();
    for heading in headings(doc) {
        if !heading.text().contains("Credits") {
            continue;
        }
        let Some(section) = heading.parent() else {
            continue;
        };
        for item in section.select("li") {
            credits.extend(split_credit_line(&item.text()));
        }
    }
    if !credits.is_empty() {
        return credits;
    }

    let tracklist = doc.select_first("table.tracklist_ZdQ0I");
    for row in doc.select("tr") {
        if tracklist.is_some_and(|t| t.contains(&row)) {
            continue;
        }
        if let [role, name] = row.select("td").as_slice() {
            let (role, name) = (role.text(), name.text());
            if !role.is_empty() && !name.is_empty() {
                credits.push(Credit::new(&name, &role));
            }
        }
    }
    credits
}

fn headings<'d, 'a>(doc: &'d Document<'a>) -> Vec<Element<'d, 'a>> {
    ["h1", "h2", "h3", "h4", "h5", "h6"]
        .iter()
        .flat_map(|tag| doc.select(tag))
        .collect()
}

/// Split `Role – Name, Name`. The en dash wins, then a spaced hyphen,
/// then a colon; hyphens inside roles (`Co-producer`) never split.
fn split_credit_line(line: &str) -> Vec<Credit> {
    let Some((role, names)) = ["–", " - ", ":"]
        .iter()
        .find_map(|sep| line.split_once(*sep))
    else {
        return Vec::new();
    };
    names
        .split(',')
        .map(|name| Credit::new(name, role))
        .filter(|c| !c.name.is_empty() && !c.role.is_empty())
        .collect()
}

fn is_production_role(role: &str) -> bool {
    let lower = role.to_lowercase();
    PRODUCTION_CREDITS.iter().any(|p| lower.contains(p))
}

fn credit_inference(role: &str, name: &str) -> Inference {
    if role.to_lowercase().contains("arrang") {
        Inference {
            role: Role::Arranger,
            confidence: Confidence::High,
        }
    } else {
        // "Conductor [Chorus Master]" style qualifiers
        let base = role.split('[').next().unwrap_or(role).trim();
        infer(Some(base), name)
    }
}

fn album_performers(names: &[String], credits: &[Credit], draft: &mut Draft) -> Vec<Artist> {
    let (names, warnings) = dedup_names(names);
    draft.warn_all(warnings);

    let mut performers = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for name in &names {
        let canonical = canonicalize(name);
        let credit = credits
            .iter()
            .find(|c| c.name == *name)
            .or_else(|| credits.iter().find(|c| canonicalize(&c.name) == canonical))
            .filter(|c| !c.is_production());
        let inferred = match credit {
            Some(credit) => credit_inference(&credit.role, name),
            None => infer_from_name(name),
        };
        draft.note(format!(
            "role: {name} -> {} ({} confidence)",
            inferred.role, inferred.confidence
        ));
        performers.push(Artist::new(name.clone(), inferred.role));
        seen.insert(canonical);
    }

    let mut appended: HashSet<(String, Role)> = HashSet::new();
    for credit in credits.iter().filter(|c| !c.is_production()) {
        let canonical = canonicalize(&credit.name);
        if seen.contains(&canonical) {
            continue;
        }
        let inferred = credit_inference(&credit.role, &credit.name);
        if appended.insert((canonical, inferred.role)) {
            draft.note(format!(
                "credit: {} ({}) -> {}",
                credit.name, credit.role, inferred.role
            ));
            performers.push(Artist::new(credit.name.clone(), inferred.role));
        }
    }

    let (performers, warnings) = dedup_artists(performers);
    draft.warn_all(warnings);
    performers
}

// ---------------------------------------------------------------------------
// Tracklist
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    DiscTrack(u32, u32),
    Track(u32),
}

fn parse_position(raw: &str) -> Option<Position> {
    if let Some(caps) = DISC_TRACK_POSITION.captures(raw) {
        let disc = caps[1].parse().ok().filter(|d| *d > 0);
        let track = caps[2].parse().ok().filter(|t| *t > 0);
        if let (Some(disc), Some(track)) = (disc, track) {
            return Some(Position::DiscTrack(disc, track));
        }
    }
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse()
        .ok()
        .filter(|n| *n > 0)
        .map(Position::Track)
}

#[derive(Debug, Clone)]
struct ParentWork {
    title: String,
    composer: Option<String>,
}

#[derive(Debug)]
struct RowTrack {
    position: Position,
    raw_position: String,
    /// Disc heading row seen just before this row.
    disc_heading: Option<String>,
    title: String,
    composer: Option<String>,
}

fn position_text(row: &Element<'_, '_>) -> String {
    row.attr("data-track-position")
        .map(str::to_string)
        .filter(|p| !p.trim().is_empty())
        .or_else(|| row.select_first("td[class*=trackPos]").map(|td| td.text()))
        .unwrap_or_default()
}

fn title_cell<'d, 'a>(row: &Element<'d, 'a>) -> Element<'d, 'a> {
    row.select_first("td[class*=trackTitle]")
        .or_else(|| row.select("td").get(1).copied())
        .unwrap_or(*row)
}

/// Title text of a cell, leaving out any embedded credits block.
fn cell_title(cell: &Element<'_, '_>) -> String {
    if let Some(span) = cell.select_first("span[class*=trackTitle]") {
        return span.text();
    }
    let html = cell.inner_html();
    match cell.select_first(".credits_vzBtg") {
        Some(credits) => clean(&html.replacen(credits.outer_html(), " ", 1)),
        None => clean(html),
    }
}

/// The composer linked from a credits block: a link credited as a
/// composition when there is one, else the first artist link.
fn credited_composer(scope: &Element<'_, '_>) -> Option<String> {
    let links = scope.select("a[href*=/artist/]");
    let composing = links.iter().find(|link| {
        link.parent().is_some_and(|p| {
            let text = p.text().to_lowercase();
            text.contains("compos") || text.contains("written")
        })
    });
    composing
        .or_else(|| links.first())
        .map(|link| artist_name(&link.text()))
        .filter(|n| !n.is_empty())
}

fn row_composer(cell: &Element<'_, '_>) -> Option<String> {
    cell.select_first(".credits_vzBtg")
        .and_then(|credits| credited_composer(&credits))
}

fn tracks(doc: &Document<'_>, draft: &mut Draft) -> ExtractResult<Vec<Track>> {
    let Some(table) = doc.select_first("table.tracklist_ZdQ0I") else {
        return Err(ExtractError::parse(SOURCE, "no tracklist table found"));
    };

    let mut rows = Vec::new();
    let mut parent: Option<ParentWork> = None;
    let mut disc_heading: Option<String> = None;
    for row in table.select("tr") {
        let cell = title_cell(&row);

        if row.has_class("heading_mkZNt") {
            let title = cell_title(&cell);
            if matches!(classify(&title), LineKind::DiscHeader { .. }) {
                log::debug!("discogs: disc heading '{title}'");
                disc_heading = Some(title);
                parent = None;
                continue;
            }
            let work = ParentWork {
                title,
                composer: row_composer(&cell).or_else(|| credited_composer(&row)),
            };
            log::debug!("discogs: work heading '{}'", work.title);
            parent = Some(work);
            continue;
        }

        let is_subtrack = row.has_class("subtrack_o3GgI");
        if !is_subtrack {
            parent = None;
            if row.attr("data-track-position").is_none() {
                continue;
            }
        }

        let raw_position = position_text(&row);
        let Some(position) = parse_position(&raw_position) else {
            draft.error(FieldError::required(
                "track",
                format!("no track number in position '{raw_position}'"),
            ));
            continue;
        };

        let own_title = cell_title(&cell);
        let own_composer = row_composer(&cell);
        let (title, composer) = match (&parent, is_subtrack) {
            (Some(work), true) => (
                format!("{}: {own_title}", work.title),
                own_composer.or_else(|| work.composer.clone()),
            ),
            _ => (own_title, own_composer),
        };
        rows.push(RowTrack {
            position,
            raw_position,
            disc_heading: disc_heading.take(),
            title,
            composer,
        });
    }

    Ok(assign_discs(rows, draft))
}

/// Turn rows into tracks. Only explicit markers change the disc: disc
/// heading rows and `D-T` positions. Everything else stays on disc 1,
/// so side-lettered positions (`A1`, `B1`) never open a new disc.
fn assign_discs(rows: Vec<RowTrack>, draft: &mut Draft) -> Vec<Track> {
    let mut lines = Vec::with_capacity(rows.len() * 2);
    let mut line_of_row = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(heading) = &row.disc_heading {
            lines.push(heading.clone());
        }
        if let Position::DiscTrack(disc, track) = row.position {
            lines.push(format!("CD {disc}"));
            draft.note(format!(
                "position {} read as disc {disc} track {track}",
                row.raw_position
            ));
        }
        line_of_row.push(lines.len());
        // A blank line takes the current disc without counting as a track.
        lines.push(String::new());
    }

    let layout = analyze(&lines);
    if layout.disc_count > 1 {
        log::debug!("discogs: {} discs from explicit markers", layout.disc_count);
    }

    rows.into_iter()
        .zip(line_of_row)
        .map(|(row, line)| {
            let number = match row.position {
                Position::DiscTrack(_, track) | Position::Track(track) => track,
            };
            let disc = layout.disc_of(line).unwrap_or(1);
            let mut track = Track::new(disc, number, row.title);
            match row.composer {
                Some(composer) => track = track.with_artist(Artist::composer(composer)),
                None => draft.error(missing_composer(disc, number)),
            }
            track
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(class: &str, position: &str, title: &str, composer: Option<&str>) -> String {
        let credits = composer.map_or_else(String::new, |c| {
            format!(
                r#"<div class="credits_vzBtg"><span>Composed By – <a href="/artist/1-{c}">{c}</a></span></div>"#
            )
        });
        format!(
            r#"<tr class="{class}" data-track-position="{position}"><td class="trackPos_n8vad">{position}</td><td class="trackTitle_loyWF"><span class="trackTitle_loyWF">{title}</span>{credits}</td><td>3:12</td></tr>"#
        )
    }

    fn page(schema: &str, rows: &[String]) -> String {
        format!(
            r#"<html><head><title>Release | Discogs</title>
<script type="application/ld+json" id="release_schema">{schema}</script></head>
<body><table class="tracklist_ZdQ0I"><tbody>{}</tbody></table></body></html>"#,
            rows.concat()
        )
    }

    const SCHEMA: &str = r#"{
        "@type": "MusicRelease",
        "name": "Noël! Christmas! Weihnachten!",
        "datePublished": 2016,
        "catalogNumber": "HMM 902000",
        "recordLabel": [{"name": "Harmonia Mundi"}],
        "releaseOf": {"byArtist": [{"name": "RIAS Kammerchor"}, {"name": "Marcus Creed"}]}
    }"#;

    fn poulenc_rows() -> Vec<String> {
        vec![
            row("", "15", "In Dulci Jubilo", Some("Michael Praetorius")),
            row(
                "heading_mkZNt",
                "",
                "Quatre Motets Pour Le Temps de Noël",
                Some("Francis Poulenc"),
            ),
            row("subtrack_o3GgI", "16", "O Magnum Mysterium", None),
            row("subtrack_o3GgI", "17", "Quem Vidistis Pastores Dicite", None),
            row("subtrack_o3GgI", "18", "Videntes Stellam", None),
            row("subtrack_o3GgI", "19", "Hodie Christus Natus Est", None),
            row("", "20", "Stille Nacht", Some("Franz Xaver Gruber")),
        ]
    }

    #[test]
    fn test_hierarchical_poulenc_tracklist() {
        let result = extract(&page(SCHEMA, &poulenc_rows())).unwrap();
        let tracks = &result.album().tracks;
        assert_eq!(tracks.len(), 6);

        let numbers: Vec<u32> = tracks.iter().map(|t| t.track).collect();
        assert_eq!(numbers, vec![15, 16, 17, 18, 19, 20]);
        assert!(tracks.iter().all(|t| t.disc == 1));

        for track in &tracks[1..5] {
            assert!(track
                .title
                .starts_with("Quatre Motets Pour Le Temps de Noël: "));
            assert_eq!(track.composer().unwrap().name, "Francis Poulenc");
        }
        assert_eq!(
            tracks[1].title,
            "Quatre Motets Pour Le Temps de Noël: O Magnum Mysterium"
        );
        assert_eq!(tracks[0].composer().unwrap().name, "Michael Praetorius");
        assert_eq!(tracks[5].composer().unwrap().name, "Franz Xaver Gruber");
        assert_eq!(tracks[5].title, "Stille Nacht");
        assert!(!result.has_error_for("composer"));
    }

    #[test]
    fn test_schema_fields() {
        let result = extract(&page(SCHEMA, &poulenc_rows())).unwrap();
        let album = result.album();
        assert_eq!(album.title, "Noël! Christmas! Weihnachten!");
        assert_eq!(album.original_year, 2016);
        assert_eq!(
            album.edition,
            Some(Edition::new("Harmonia Mundi", "HMM 902000", 2016))
        );
        assert_eq!(
            album.album_artist,
            vec![
                Artist::new("RIAS Kammerchor", Role::Ensemble),
                Artist::new("Marcus Creed", Role::Soloist),
            ]
        );
    }

    #[test]
    fn test_dedup_true_positive() {
        let schema = r#"{"name": "X", "datePublished": "2001-01-01",
            "releaseOf": {"byArtist": [{"name": "RIAS-Kammerchor"}, {"name": "RIAS Kammerchor"}]}}"#;
        let result = extract(&page(schema, &poulenc_rows())).unwrap();
        let performers = &result.album().album_artist;
        assert_eq!(performers.len(), 1);
        assert_eq!(performers[0].name, "RIAS-Kammerchor");

        let merges: Vec<&String> = result
            .warnings()
            .iter()
            .filter(|w| w.starts_with("duplication"))
            .collect();
        assert_eq!(merges.len(), 1);
        assert!(merges[0].contains("RIAS-Kammerchor"));
        assert!(merges[0].contains("RIAS Kammerchor"));
        assert!(merges[0].contains("riaskammerchor"));
    }

    #[test]
    fn test_dedup_false_positive_guard() {
        let schema = r#"{"name": "X", "datePublished": 1999,
            "releaseOf": {"byArtist": [{"name": "Berlin Philharmonic Orchestra"}, {"name": "Berlin Philharmonic"}]}}"#;
        let result = extract(&page(schema, &poulenc_rows())).unwrap();
        assert_eq!(result.album().album_artist.len(), 2);
        assert!(result.warnings().is_empty());
    }

    #[test]
    fn test_release_credits_assign_roles() {
        let schema = r#"{"name": "X", "datePublished": 2016,
            "releaseOf": {"byArtist": [{"name": "RIAS Kammerchor"}, {"name": "Marcus Creed"}]}}"#;
        let state = r#"<script>window.__STATE__ = {"x": 1, "releaseCredits": [
            {"displayName": "Marcus Creed", "creditRole": "Conductor", "nameVariation": null},
            {"displayName": "Sarah Wegener", "creditRole": "Soprano Vocals [solo] \"]\"", "nameVariation": null},
            {"displayName": "Stephan Schellmann", "creditRole": "Recorded By", "nameVariation": null}
        ], "y": [1, 2]};</script>"#;
        let body = page(schema, &poulenc_rows()).replace("</body>", &format!("{state}</body>"));
        let result = extract(&body).unwrap();
        assert_eq!(
            result.album().album_artist,
            vec![
                Artist::new("RIAS Kammerchor", Role::Ensemble),
                Artist::new("Marcus Creed", Role::Conductor),
                Artist::new("Sarah Wegener", Role::Soloist),
            ]
        );
    }

    #[test]
    fn test_html_credits_fallback() {
        let schema = r#"{"name": "X", "datePublished": 2016,
            "releaseOf": {"byArtist": [{"name": "Marcus Creed"}]}}"#;
        let credits = r#"<section><h2>Credits</h2><ul>
            <li>Conductor – Marcus Creed</li>
            <li>Choir: RIAS-Kammerchor</li>
            <li>Producer – Someone Else</li>
        </ul></section>"#;
        let body = page(schema, &poulenc_rows()).replace("<body>", &format!("<body>{credits}"));
        let result = extract(&body).unwrap();
        assert_eq!(
            result.album().album_artist,
            vec![
                Artist::new("Marcus Creed", Role::Conductor),
                Artist::new("RIAS-Kammerchor", Role::Ensemble),
            ]
        );
    }

    #[test]
    fn test_split_credit_line_keeps_hyphenated_roles() {
        let credits = split_credit_line("Co-producer – Jane Roe, John Doe");
        assert_eq!(credits.len(), 2);
        assert_eq!(credits[0], Credit::new("Jane Roe", "Co-producer"));
        assert_eq!(split_credit_line("Choir: RIAS-Kammerchor")[0].role, "Choir");
        assert_eq!(split_credit_line("Conductor - Marcus Creed")[0].name, "Marcus Creed");
        assert!(split_credit_line("Liner notes").is_empty());
    }

    #[test]
    fn test_find_json_array() {
        let text = r#"foo "releaseCredits" : [ {"a": "x]y"}, [1, [2]], "q\"]" ] tail"#;
        assert_eq!(
            find_json_array(text, CREDITS_KEY),
            Some(r#"[ {"a": "x]y"}, [1, [2]], "q\"]" ]"#)
        );
        assert_eq!(find_json_array(r#""releaseCredits": 5"#, CREDITS_KEY), None);
        assert_eq!(find_json_array(r#""releaseCredits": [1, 2"#, CREDITS_KEY), None);
    }

    #[test]
    fn test_disc_track_positions() {
        let rows = vec![
            row("", "1-01", "A", Some("Bach")),
            row("", "1-02", "B", Some("Bach")),
            row("", "2-01", "C", Some("Bach")),
        ];
        let result = extract(&page(SCHEMA, &rows)).unwrap();
        let tracks = &result.album().tracks;
        assert_eq!((tracks[2].disc, tracks[2].track), (2, 1));
        assert_eq!((tracks[1].disc, tracks[1].track), (1, 2));
        assert!(result.notes().iter().any(|n| n.contains("2-01")));
    }

    fn positions(result: &ExtractionResult) -> Vec<(u32, u32)> {
        result.album().tracks.iter().map(|t| (t.disc, t.track)).collect()
    }

    #[test]
    fn test_track_number_restart_stays_on_disc_one() {
        let rows = vec![
            row("", "1", "A", Some("Bach")),
            row("", "2", "B", Some("Bach")),
            row("", "1", "C", Some("Bach")),
        ];
        let result = extract(&page(SCHEMA, &rows)).unwrap();
        assert_eq!(positions(&result), vec![(1, 1), (1, 2), (1, 1)]);
    }

    #[test]
    fn test_vinyl_sides_stay_on_disc_one() {
        let rows: Vec<String> = ["A1", "A2", "B1", "B2"]
            .iter()
            .map(|p| row("", p, "Side", Some("Bach")))
            .collect();
        let result = extract(&page(SCHEMA, &rows)).unwrap();
        assert_eq!(positions(&result), vec![(1, 1), (1, 2), (1, 1), (1, 2)]);
    }

    #[test]
    fn test_cd_prefixed_positions() {
        let rows: Vec<String> = ["CD1-1", "CD1-2", "CD2-1"]
            .iter()
            .map(|p| row("", p, "Aria", Some("Bach")))
            .collect();
        let result = extract(&page(SCHEMA, &rows)).unwrap();
        assert_eq!(positions(&result), vec![(1, 1), (1, 2), (2, 1)]);
    }

    #[test]
    fn test_disc_heading_rows_set_disc() {
        let rows = vec![
            row("heading_mkZNt", "", "CD 1", None),
            row("", "1", "Sinfony", Some("Handel")),
            row("", "2", "Comfort ye", Some("Handel")),
            row("heading_mkZNt", "", "CD 2", None),
            row("", "1", "Hallelujah", Some("Handel")),
        ];
        let result = extract(&page(SCHEMA, &rows)).unwrap();
        assert_eq!(positions(&result), vec![(1, 1), (1, 2), (2, 1)]);
        assert_eq!(result.album().tracks[2].title, "Hallelujah");
    }

    #[test]
    fn test_missing_composer_is_required_error() {
        let rows = vec![row("", "1", "Anon", None)];
        let result = extract(&page(SCHEMA, &rows)).unwrap();
        assert!(result.has_error_for("composer"));
    }

    #[test]
    fn test_missing_schema_is_a_warning() {
        let body = r#"<html><head><title>Fallback Title | Releases | Discogs</title></head>
            <body><table class="tracklist_ZdQ0I"></table></body></html>"#;
        let result = extract(body).unwrap();
        assert_eq!(result.album().title, "Fallback Title");
        assert!(result.warnings().iter().any(|w| w.contains("JSON-LD")));
        assert!(result.has_error_for("original_year"));
    }

    #[test]
    fn test_malformed_schema_is_parse_error() {
        let body = r#"<script type="application/ld+json" id="release_schema">{not json</script>
            <table class="tracklist_ZdQ0I"></table>"#;
        assert!(matches!(extract(body), Err(ExtractError::Parse { .. })));
    }

    #[test]
    fn test_missing_tracklist_is_parse_error() {
        let body = format!(
            r#"<script type="application/ld+json" id="release_schema">{SCHEMA}</script>"#
        );
        let err = extract(&body).unwrap_err();
        assert!(err.to_string().contains("no tracklist table"));
    }

    #[test]
    fn test_artist_name_suffixes() {
        assert_eq!(artist_name("Marcus Creed (2)"), "Marcus Creed");
        assert_eq!(artist_name("RIAS-Kammerchor*"), "RIAS-Kammerchor");
        assert_eq!(artist_name("Orchestra 1"), "Orchestra 1");
        assert_eq!(artist_name("BERLINER PHILHARMONIKER (3)"), "Berliner Philharmoniker");
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("16"), Some(Position::Track(16)));
        assert_eq!(parse_position("A1"), Some(Position::Track(1)));
        assert_eq!(parse_position("2-05"), Some(Position::DiscTrack(2, 5)));
        assert_eq!(parse_position("CD2-1"), Some(Position::DiscTrack(2, 1)));
        assert_eq!(parse_position("disc 3-04"), Some(Position::DiscTrack(3, 4)));
        assert_eq!(parse_position(""), None);
    }
}
