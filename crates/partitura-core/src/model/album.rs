use crate::model::artist::Artist;

/// Sentinel title for an album whose title could not be found.
pub const MISSING_TITLE: &str = "[MISSING]";

/// Placeholder label synthesized when only a catalog number is known.
pub const UNKNOWN_LABEL: &str = "[Unknown Label]";

/// Album artist literal that opts out of performer propagation.
pub const VARIOUS_ARTISTS: &str = "Various Artists";

/// The label + catalog + year tuple distinguishing one release of an album.
///
/// Any field may be empty (zero) straight out of an extractor; the
/// normalizer fills what it can.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Edition {
    pub label: String,
    pub catalog_number: String,
    pub year: u32,
}

impl Edition {
    #[must_use]
    pub fn new(label: impl Into<String>, catalog_number: impl Into<String>, year: u32) -> Self {
        Self {
            label: label.into(),
            catalog_number: catalog_number.into(),
            year,
        }
    }

    /// True when no field carries information.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.label.is_empty() && self.catalog_number.is_empty() && self.year == 0
    }
}

/// Location of the audio file a track was read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackFile {
    /// Forward-slash path relative to the album root.
    pub path: String,
}

/// One physically numbered track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub disc: u32,
    pub track: u32,
    pub title: String,
    pub artists: Vec<Artist>,

    /// Present only for tag-sourced tracks.
    pub file: Option<TrackFile>,
}

impl Track {
    #[must_use]
    pub fn new(disc: u32, track: u32, title: impl Into<String>) -> Self {
        Self {
            disc,
            track,
            title: title.into(),
            artists: Vec::new(),
            file: None,
        }
    }

    #[must_use]
    pub fn with_artist(mut self, artist: Artist) -> Self {
        self.artists.push(artist);
        self
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.file = Some(TrackFile { path: path.into() });
        self
    }

    /// The first composer credited on this track.
    #[must_use]
    pub fn composer(&self) -> Option<&Artist> {
        self.artists.iter().find(|a| a.is_composer())
    }

    /// Every non-composer artist, in credit order.
    pub fn performers(&self) -> impl Iterator<Item = &Artist> {
        self.artists.iter().filter(|a| !a.is_composer())
    }

    /// Whether an artist with exactly this name and role is credited.
    #[must_use]
    pub fn has_artist(&self, artist: &Artist) -> bool {
        self.artists.contains(artist)
    }

    /// Basename of the source file, when known.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file
            .as_ref()
            .map(|f| f.path.rsplit('/').next().unwrap_or(f.path.as_str()))
    }
}

/// The canonical in-memory album record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub folder_name: String,
    pub title: String,
    pub original_year: u32,
    pub edition: Option<Edition>,
    pub album_artist: Vec<Artist>,
    pub tracks: Vec<Track>,
}

impl Default for Album {
    fn default() -> Self {
        Self {
            folder_name: String::new(),
            title: MISSING_TITLE.to_string(),
            original_year: 0,
            edition: None,
            album_artist: Vec::new(),
            tracks: Vec::new(),
        }
    }
}

impl Album {
    #[must_use]
    pub fn new(title: impl Into<String>, original_year: u32) -> Self {
        Self {
            title: title.into(),
            original_year,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty() && self.title != MISSING_TITLE
    }

    /// Highest disc number used by any track (at least 1).
    #[must_use]
    pub fn disc_count(&self) -> u32 {
        self.tracks.iter().map(|t| t.disc).max().unwrap_or(1).max(1)
    }

    /// Album artists joined the way tag writers format them.
    #[must_use]
    pub fn formatted_album_artist(&self) -> String {
        self.album_artist
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// True when the album artist is the literal "Various Artists".
    #[must_use]
    pub fn is_various_artists(&self) -> bool {
        self.formatted_album_artist()
            .eq_ignore_ascii_case(VARIOUS_ARTISTS)
    }
}
