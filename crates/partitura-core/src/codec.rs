//! Canonical JSON encoding of an [`Album`].
//!
//! Writers always put the composer inside `artists`. Readers also accept
//! the older shape with a separate `composer` object on each track.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Album, Artist, Edition, Role, Track, TrackFile};

#[derive(Debug, Serialize, Deserialize)]
struct AlbumDoc {
    title: String,
    original_year: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    edition: Option<EditionDoc>,
    #[serde(default)]
    tracks: Vec<TrackDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EditionDoc {
    #[serde(default)]
    label: String,
    #[serde(default)]
    catalog_number: String,
    #[serde(default)]
    edition_year: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct TrackDoc {
    disc: u32,
    track: u32,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    composer: Option<Artist>,
    #[serde(default)]
    artists: Vec<Artist>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl From<&Album> for AlbumDoc {
    fn from(album: &Album) -> Self {
        Self {
            title: album.title.clone(),
            original_year: album.original_year,
            edition: album.edition.as_ref().map(|e| EditionDoc {
                label: e.label.clone(),
                catalog_number: e.catalog_number.clone(),
                edition_year: e.year,
            }),
            tracks: album
                .tracks
                .iter()
                .map(|t| TrackDoc {
                    disc: t.disc,
                    track: t.track,
                    title: t.title.clone(),
                    composer: None,
                    artists: t.artists.clone(),
                    name: t.file.as_ref().map(|f| f.path.clone()),
                })
                .collect(),
        }
    }
}

impl TryFrom<AlbumDoc> for Album {
    type Error = Error;

    fn try_from(doc: AlbumDoc) -> Result<Self> {
        let tracks = doc
            .tracks
            .into_iter()
            .map(track_from_doc)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            title: doc.title,
            original_year: doc.original_year,
            edition: doc
                .edition
                .map(|e| Edition::new(e.label, e.catalog_number, e.edition_year)),
            tracks,
            ..Self::default()
        })
    }
}

fn track_from_doc(doc: TrackDoc) -> Result<Track> {
    if doc.disc == 0 || doc.track == 0 {
        return Err(Error::InvalidData(format!(
            "disc and track must be positive (got disc {} track {})",
            doc.disc, doc.track
        )));
    }

    let mut artists = doc.artists;
    if let Some(composer) = doc.composer {
        let composer = composer.with_role(Role::Composer);
        if !artists.contains(&composer) {
            artists.insert(0, composer);
        }
    }

    Ok(Track {
        disc: doc.disc,
        track: doc.track,
        title: doc.title,
        artists,
        file: doc.name.map(|path| TrackFile { path }),
    })
}

/// Encode `album` as pretty-printed canonical JSON.
pub fn to_json(album: &Album) -> Result<String> {
    Ok(serde_json::to_string_pretty(&AlbumDoc::from(album))?)
}

/// Decode canonical JSON in either the current or the older track shape.
pub fn from_json(json: &str) -> Result<Album> {
    let doc: AlbumDoc = serde_json::from_str(json)?;
    Album::try_from(doc)
}

/// Write `album` to `path`, with a trailing newline.
pub fn write_file(path: &Path, album: &Album) -> Result<()> {
    let mut json = to_json(album)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}

pub fn read_file(path: &Path) -> Result<Album> {
    let json = fs::read_to_string(path)?;
    from_json(&json)
}
