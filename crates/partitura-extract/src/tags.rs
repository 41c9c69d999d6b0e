//! Album extraction from per-file audio tags.
//!
//! The directory walk and the tag decoding sit behind [`TagReader`], so the
//! extraction rules in [`extract_from_files`] work on plain key/value maps
//! and never touch the filesystem.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Datelike;
use lofty::config::ParseOptions;
use lofty::file::AudioFile;
use lofty::flac::FlacFile;
use regex::Regex;
use walkdir::WalkDir;

use partitura_core::model::{Album, Artist, Edition, Track, MISSING_TITLE};
use partitura_core::normalize::{missing_composer, missing_title, missing_year};
use partitura_core::text::{clean_name, normalize_whitespace};
use partitura_core::{ExtractionResult, FieldError};

use crate::config::Config;
use crate::draft::Draft;
use crate::error::{ExtractError, ExtractResult};

/// Source label recorded on tag-built results.
pub const SOURCE: &str = "tags";

/// Tag key whose presence aborts extraction.
const DJ_KEY: &str = "DJ";

#[allow(clippy::unwrap_used)]
static DISC_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:cd|disc|disk|dvd)\s*(\d+)?\s*$").unwrap());

#[allow(clippy::unwrap_used)]
static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3})(?:[ \-._]|$)").unwrap());

#[allow(clippy::unwrap_used)]
static LEADING_NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}[ \-._]+").unwrap());

#[allow(clippy::unwrap_used)]
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());

#[allow(clippy::unwrap_used)]
static COMMENT_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*label\s*:\s*(.+?)\s*$").unwrap());

#[allow(clippy::unwrap_used)]
static COMMENT_CATALOG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*catalog\s*(?:number)?\s*:\s*(.+?)\s*$").unwrap());

#[allow(clippy::unwrap_used)]
static FORMAT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*\[(?:flac|mp3|aac|alac|wav|ape|wv|24-\d+|16-\d+)\]\s*$").unwrap()
});

#[allow(clippy::unwrap_used)]
static DIR_TITLE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*[\(\[]\s*(\d{4})\s*[\)\]]").unwrap());

// ---------------------------------------------------------------------------
// Tag readers
// ---------------------------------------------------------------------------

/// Uppercased tag keys mapped to their values.
pub type TagMap = BTreeMap<String, String>;

/// Reads the tag dictionary of one audio file.
///
/// Absent keys are simply missing from the map. Repeated keys are joined
/// with `"; "` so the artist rule splits them again.
pub trait TagReader: fmt::Debug {
    fn read_tags(&self, path: &Path) -> ExtractResult<TagMap>;
}

/// Reads FLAC Vorbis comments with lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read_tags(&self, path: &Path) -> ExtractResult<TagMap> {
        let mut file = File::open(path).map_err(|e| ExtractError::io(path, e))?;
        let flac = FlacFile::read_from(&mut file, ParseOptions::new()).map_err(|e| {
            ExtractError::parse(SOURCE, format!("{}: {e}", path.display()))
        })?;

        let mut tags = TagMap::new();
        if let Some(comments) = flac.vorbis_comments() {
            for (key, value) in comments.items() {
                insert_tag(&mut tags, key, value);
            }
        } else {
            log::warn!("no Vorbis comment block in {}", path.display());
        }
        Ok(tags)
    }
}

/// Tag maps held in memory, keyed by path suffix.
///
/// A lookup matches when the requested path ends with a registered path,
/// so entries may be registered relative to the album directory. An exact
/// match wins, then the longest matching suffix.
#[derive(Debug, Clone, Default)]
pub struct MemoryTagReader {
    files: BTreeMap<PathBuf, TagMap>,
}

impl MemoryTagReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register tags for `path` from `(key, value)` pairs.
    #[must_use]
    pub fn with_file<K, V>(mut self, path: impl Into<PathBuf>, tags: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map = TagMap::new();
        for (key, value) in tags {
            insert_tag(&mut map, key.as_ref(), value.as_ref());
        }
        self.files.insert(path.into(), map);
        self
    }
}

impl TagReader for MemoryTagReader {
    fn read_tags(&self, path: &Path) -> ExtractResult<TagMap> {
        if let Some(tags) = self.files.get(path) {
            return Ok(tags.clone());
        }
        Ok(self
            .files
            .iter()
            .filter(|(registered, _)| path.ends_with(registered))
            .max_by_key(|(registered, _)| registered.components().count())
            .map(|(_, tags)| tags.clone())
            .unwrap_or_default())
    }
}

fn insert_tag(tags: &mut TagMap, key: &str, value: &str) {
    let key = key.trim().to_uppercase();
    tags.entry(key)
        .and_modify(|existing| {
            existing.push_str("; ");
            existing.push_str(value);
        })
        .or_insert_with(|| value.to_string());
}

// ---------------------------------------------------------------------------
// Directory reading
// ---------------------------------------------------------------------------

/// One audio file's tags, with its forward-slash path relative to the
/// album root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFile {
    pub path: String,
    pub tags: TagMap,
}

impl TagFile {
    #[must_use]
    pub fn new(path: impl Into<String>, tags: TagMap) -> Self {
        Self {
            path: path.into(),
            tags,
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        self.tags
            .get(key)
            .map(|v| normalize_whitespace(v))
            .filter(|v| !v.is_empty())
    }

    fn stem(&self) -> &str {
        let base = self.path.rsplit('/').next().unwrap_or(&self.path);
        base.rsplit_once('.').map_or(base, |(stem, _)| stem)
    }

    fn parent_dirs(&self) -> impl Iterator<Item = &str> {
        let mut parts: Vec<&str> = self.path.split('/').collect();
        parts.pop();
        parts.into_iter().rev()
    }
}

/// Walk `dir` and read the tags of every audio file, in lexicographic
/// path order.
pub fn read_album_dir(
    dir: &Path,
    reader: &dyn TagReader,
    config: &Config,
) -> ExtractResult<Vec<TagFile>> {
    if !dir.is_dir() {
        return Err(ExtractError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|e| ExtractError::io(dir, e.into()))?;
        let path = entry.path();
        let audio = path
            .extension()
            .is_some_and(|ext| config.is_audio_extension(&ext.to_string_lossy()));
        if entry.file_type().is_file() && audio {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(ExtractError::NoAudioFiles {
            path: dir.to_path_buf(),
        });
    }
    log::info!("found {} audio files in {}", paths.len(), dir.display());

    paths
        .iter()
        .map(|path| {
            log::debug!("reading tags: {}", path.display());
            let tags = reader.read_tags(path)?;
            Ok(TagFile::new(relative_path(dir, path), tags))
        })
        .collect()
}

fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Name of the album directory itself.
pub fn folder_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Split an artist tag value: on `;` when present, else on `,`.
pub fn parse_artist_field(value: &str) -> Vec<Artist> {
    let separator = if value.contains(';') { ';' } else { ',' };
    value
        .split(separator)
        .map(clean_name)
        .filter(|name| !name.is_empty())
        .map(Artist::unknown)
        .collect()
}

/// Leading positive number of `N` or `N/M`.
fn parse_position(value: &str) -> Option<u32> {
    value
        .split('/')
        .next()
        .and_then(|n| n.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
}

fn parse_year(value: &str) -> Option<u32> {
    YEAR.find(value).and_then(|m| m.as_str().parse().ok())
}

fn disc_from_dirs(file: &TagFile) -> Option<u32> {
    file.parent_dirs().find_map(|dir| {
        DISC_DIR.captures(dir).map(|caps| {
            caps.get(1)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(1)
        })
    })
}

fn track_from_filename(file: &TagFile) -> Option<u32> {
    LEADING_NUMBER
        .captures(file.stem())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|n| *n > 0)
}

fn title_from_filename(file: &TagFile) -> String {
    let stem = file.stem();
    normalize_whitespace(&LEADING_NUMBER_PREFIX.replace(stem, ""))
}

fn edition_from_tags(file: &TagFile) -> Option<Edition> {
    let label = file.get("LABEL").or_else(|| file.get("ORGANIZATION"));
    let catalog = file.get("CATALOGNUMBER");
    let year = file.get("DATE").as_deref().and_then(parse_year);

    if label.is_some() || catalog.is_some() || year.is_some() {
        return Some(Edition::new(
            label.unwrap_or_default(),
            catalog.unwrap_or_default(),
            year.unwrap_or(0),
        ));
    }

    let comment = file.tags.get("COMMENT")?;
    let label = COMMENT_LABEL.captures(comment).map(|c| c[1].to_string());
    let catalog = COMMENT_CATALOG.captures(comment).map(|c| c[1].to_string());
    if label.is_none() && catalog.is_none() {
        return None;
    }
    Some(Edition::new(
        label.unwrap_or_default(),
        catalog.unwrap_or_default(),
        0,
    ))
}

/// Title and year from a `Title (YYYY) [FLAC]` style directory name.
pub fn parse_folder_name(name: &str) -> Option<(String, u32)> {
    let mut stripped = name.trim().to_string();
    while FORMAT_MARKER.is_match(&stripped) {
        stripped = FORMAT_MARKER.replace(&stripped, "").into_owned();
    }

    let caps = DIR_TITLE_YEAR.captures(&stripped)?;
    let year: u32 = caps[2].parse().ok()?;
    let latest = u32::try_from(chrono::Local::now().year() + 1).unwrap_or(u32::MAX);
    if !(1900..=latest).contains(&year) {
        return None;
    }
    let title = normalize_whitespace(&caps[1]);
    (!title.is_empty()).then_some((title, year))
}

/// Build a draft album from tag maps.
///
/// Files are processed in lexicographic path order regardless of input
/// order.
pub fn extract_from_files(
    folder_name: &str,
    mut files: Vec<TagFile>,
) -> ExtractResult<ExtractionResult> {
    if files.is_empty() {
        return Err(ExtractError::NoAudioFiles {
            path: PathBuf::from(folder_name),
        });
    }
    if let Some(file) = files.iter().find(|f| f.tags.contains_key(DJ_KEY)) {
        return Err(ExtractError::Unsupported {
            message: format!("DJ tag present in {}; DJ mixes are not handled", file.path),
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let mut draft = Draft::default();

    let first = &files[0];
    let mut album = Album {
        folder_name: folder_name.to_string(),
        ..Album::default()
    };
    if let Some(title) = first.get("ALBUM") {
        album.title = title;
    }
    if let Some(year) = first.get("ORIGINALDATE").as_deref().and_then(parse_year) {
        album.original_year = year;
    } else if let Some(year) = first.get("YEAR").as_deref().and_then(parse_year) {
        album.original_year = year;
    } else if let Some(year) = first.get("DATE").as_deref().and_then(parse_year) {
        album.original_year = year;
        draft.note(format!("original year {year} taken from DATE"));
    }
    if let Some(value) = first.get("ALBUMARTIST") {
        album.album_artist = parse_artist_field(&value);
    }
    album.edition = edition_from_tags(first);

    let mut album_artist_values: Vec<String> = Vec::new();
    for file in &files {
        if let Some(value) = file.get("ALBUMARTIST") {
            if !album_artist_values.contains(&value) {
                album_artist_values.push(value);
            }
        }

        let disc = file
            .get("DISCNUMBER")
            .as_deref()
            .and_then(parse_position)
            .or_else(|| disc_from_dirs(file))
            .unwrap_or(1);

        let Some(number) = file
            .get("TRACKNUMBER")
            .as_deref()
            .and_then(parse_position)
            .or_else(|| track_from_filename(file))
        else {
            log::warn!("no track number for {}; skipping", file.path);
            draft.error(FieldError::required(
                "track",
                format!("no track number for {}", file.path),
            ));
            continue;
        };

        let title = file.get("TITLE").unwrap_or_else(|| {
            draft.note(format!("title for {} taken from file name", file.path));
            title_from_filename(file)
        });

        let mut track = Track::new(disc, number, title).with_file(file.path.clone());
        match file.get("COMPOSER") {
            Some(value) => track = track.with_artist(Artist::composer(clean_name(&value))),
            None => draft.error(missing_composer(disc, number)),
        }
        if let Some(value) = file.get("ARTIST").or_else(|| file.get("ALBUMARTIST")) {
            for artist in parse_artist_field(&value) {
                track = track.with_artist(artist);
            }
        }

        log::debug!("track {disc}-{number}: {} ({})", track.title, file.path);
        album.tracks.push(track);
    }

    match album_artist_values.as_slice() {
        [] => {}
        [only] => {
            if album.album_artist.is_empty() {
                album.album_artist = parse_artist_field(only);
            }
        }
        many => draft.error(FieldError::optional(
            "album_artist",
            format!("inconsistent album artist: {}", many.join(" | ")),
        )),
    }

    let title_from_tags = album.title != MISSING_TITLE;
    if !title_from_tags || album.original_year == 0 {
        if let Some((title, year)) = parse_folder_name(folder_name) {
            if !title_from_tags {
                album.title = title;
                draft.note("title taken from directory name");
            }
            if album.original_year == 0 {
                album.original_year = year;
                draft.note(format!("original year {year} taken from directory name"));
            }
        }
    }
    if album.title == MISSING_TITLE {
        draft.error(missing_title());
    }
    if album.original_year == 0 {
        draft.error(missing_year());
    }

    log::info!(
        "built {} tracks from {} files for '{}'",
        album.tracks.len(),
        files.len(),
        album.title
    );

    Ok(draft.finish(album, SOURCE))
}
