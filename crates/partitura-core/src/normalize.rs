//! Album normalization applied after every source extractor.
//!
//! The steps run in a fixed order:
//!
//! 1. resolve `unknown` track roles from artist names;
//! 2. promote universal performers to the album level;
//! 3. propagate album-level performers back onto every track;
//! 4. synthesize edition defaults;
//! 5. check the record's invariants.
//!
//! Nothing here fails. Every problem becomes an error, warning or note
//! on the returned [`ExtractionResult`].

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::model::{Album, Artist, Role, Track, UNKNOWN_LABEL, VARIOUS_ARTISTS};
use crate::names::{canonicalize, dedup_artists};
use crate::result::{ExtractionResult, FieldError, Stage};
use crate::roles::{infer_from_name, Confidence};

/// Edition year used when neither the edition nor the album has one.
pub const PLACEHOLDER_EDITION_YEAR: u32 = 1900;

/// The error recorded for a track without a composer.
///
/// Extractors and the normalizer share this so the same track is never
/// reported twice.
pub fn missing_composer(disc: u32, track: u32) -> FieldError {
    FieldError::required("composer", format!("missing composer for disc {disc} track {track}"))
}

pub fn missing_title() -> FieldError {
    FieldError::required("title", "album title not found")
}

pub fn missing_year() -> FieldError {
    FieldError::required("original_year", "album year not found")
}

/// Normalize the album held by `result`.
pub fn normalize(result: ExtractionResult) -> ExtractionResult {
    let mut album = result.album().clone();
    let mut diagnostics = Diagnostics::default();

    resolve_track_roles(&mut album, &mut diagnostics);
    promote_universal_performers(&mut album, &mut diagnostics);
    propagate_album_artists(&mut album, &mut diagnostics);
    synthesize_edition(&mut album, &mut diagnostics);
    check_invariants(&album, &mut diagnostics);

    log::debug!(
        "normalized '{}': {} tracks, {} album artists, {} errors, {} warnings",
        album.title,
        album.tracks.len(),
        album.album_artist.len(),
        diagnostics.errors.len(),
        diagnostics.warnings.len()
    );

    let result = diagnostics
        .errors
        .into_iter()
        .fold(result.with_album(album), ExtractionResult::with_unique_error);
    diagnostics
        .notes
        .into_iter()
        .fold(result, ExtractionResult::with_note)
        .with_warnings(diagnostics.warnings)
        .with_stage(Stage::Normalized)
}

#[derive(Debug, Default)]
struct Diagnostics {
    errors: Vec<FieldError>,
    warnings: Vec<String>,
    notes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

fn resolve_track_roles(album: &mut Album, diag: &mut Diagnostics) {
    let mut resolved: BTreeSet<(String, Role, Confidence)> = BTreeSet::new();

    for track in &mut album.tracks {
        for artist in &mut track.artists {
            if artist.role == Role::Unknown {
                let inferred = infer_from_name(&artist.name);
                artist.role = inferred.role;
                resolved.insert((artist.name.clone(), inferred.role, inferred.confidence));
            }
        }

        let mut seen = HashSet::new();
        track.artists.retain(|a| seen.insert(a.clone()));

        let mut composers = track.artists.iter().filter(|a| a.is_composer());
        if let Some(first) = composers.next() {
            let first = first.clone();
            let extra: Vec<String> = composers.map(|a| a.name.clone()).collect();
            if !extra.is_empty() {
                for name in &extra {
                    diag.warnings.push(format!(
                        "disc {} track {}: dropped extra composer {name} (kept {})",
                        track.disc, track.track, first.name
                    ));
                }
                track
                    .artists
                    .retain(|a| !a.is_composer() || *a == first);
            }
        }
    }

    for (name, role, confidence) in resolved {
        diag.notes
            .push(format!("role: {name} -> {role} ({confidence} confidence)"));
    }
}

/// Non-composer artists present, with identical name and role, on every track.
pub fn universal_performers(tracks: &[Track]) -> Vec<Artist> {
    let Some((first, rest)) = tracks.split_first() else {
        return Vec::new();
    };
    first
        .performers()
        .filter(|artist| rest.iter().all(|t| t.has_artist(artist)))
        .cloned()
        .collect()
}

fn canonical_names(artists: &[Artist]) -> BTreeSet<String> {
    artists.iter().map(|a| canonicalize(&a.name)).collect()
}

fn promote_universal_performers(album: &mut Album, diag: &mut Diagnostics) {
    let universal = universal_performers(&album.tracks);

    if !universal.is_empty() {
        if album.album_artist.is_empty() {
            diag.notes.push(format!(
                "album artist promoted from tracks: {}",
                join_names(&universal)
            ));
            album.album_artist = universal;
        } else if canonical_names(&universal) == canonical_names(&album.album_artist) {
            diag.notes.push(format!(
                "album artist roles taken from tracks: {}",
                join_names(&universal)
            ));
            album.album_artist = universal;
        } else {
            let keys: HashSet<(String, Role)> = album
                .album_artist
                .iter()
                .map(|a| (canonicalize(&a.name), a.role))
                .collect();
            let added: Vec<Artist> = universal
                .into_iter()
                .filter(|a| !keys.contains(&(canonicalize(&a.name), a.role)))
                .collect();
            if !added.is_empty() {
                diag.warnings.push(format!(
                    "track performers differ from album artist; added {}",
                    join_names(&added)
                ));
                album.album_artist.extend(added);
            }
        }
    }

    resolve_album_roles(album, diag);

    let (deduped, warnings) = dedup_artists(std::mem::take(&mut album.album_artist));
    album.album_artist = deduped;
    diag.warnings.extend(warnings);
}

/// Give `unknown` album artists the role they carry most often on the
/// tracks, falling back to the name heuristic.
fn resolve_album_roles(album: &mut Album, diag: &mut Diagnostics) {
    for index in 0..album.album_artist.len() {
        if album.album_artist[index].role != Role::Unknown {
            continue;
        }
        let name = album.album_artist[index].name.clone();
        let canonical = canonicalize(&name);

        let mut counts: HashMap<Role, usize> = HashMap::new();
        for artist in album.tracks.iter().flat_map(|t| t.performers()) {
            if artist.role != Role::Unknown && canonicalize(&artist.name) == canonical {
                *counts.entry(artist.role).or_default() += 1;
            }
        }
        let from_tracks = counts
            .into_iter()
            .max_by(|(ra, ca), (rb, cb)| ca.cmp(cb).then(rb.cmp(ra)))
            .map(|(role, _)| role);

        let role = match from_tracks {
            Some(role) => {
                diag.notes
                    .push(format!("role: {name} -> {role} (from track credits)"));
                role
            }
            None => {
                let inferred = infer_from_name(&name);
                diag.notes.push(format!(
                    "role: {name} -> {} ({} confidence)",
                    inferred.role, inferred.confidence
                ));
                inferred.role
            }
        };
        album.album_artist[index].role = role;
    }
}

fn join_names(artists: &[Artist]) -> String {
    artists
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Propagation
// ---------------------------------------------------------------------------

fn propagate_album_artists(album: &mut Album, diag: &mut Diagnostics) {
    if album.is_various_artists() {
        diag.notes
            .push("album artist is Various Artists; no propagation".to_string());
        return;
    }

    let mut added = 0usize;
    for artist in &album.album_artist {
        if artist.name.eq_ignore_ascii_case(VARIOUS_ARTISTS) {
            continue;
        }
        for track in &mut album.tracks {
            if track.has_artist(artist) {
                continue;
            }
            // A track keeps at most one composer.
            if artist.is_composer() && track.composer().is_some() {
                continue;
            }
            track.artists.push(artist.clone());
            added += 1;
        }
    }
    if added > 0 {
        diag.notes
            .push(format!("propagated {added} album artist credits to tracks"));
    }
}

// ---------------------------------------------------------------------------
// Edition
// ---------------------------------------------------------------------------

fn synthesize_edition(album: &mut Album, diag: &mut Diagnostics) {
    let original_year = album.original_year;
    let Some(edition) = album.edition.as_mut() else {
        diag.errors.push(FieldError::optional(
            "edition",
            "no label, catalog number or edition year found",
        ));
        return;
    };

    if edition.year == 0 {
        if original_year > 0 {
            edition.year = original_year;
            diag.warnings.push(format!(
                "edition year missing; using original year {original_year}"
            ));
        } else {
            edition.year = PLACEHOLDER_EDITION_YEAR;
            diag.warnings.push(format!(
                "edition year missing; using placeholder {PLACEHOLDER_EDITION_YEAR}"
            ));
        }
    }

    if edition.catalog_number.is_empty() {
        diag.errors.push(FieldError::optional(
            "catalog_number",
            "no catalog number found",
        ));
    } else if edition.label.is_empty() {
        edition.label = UNKNOWN_LABEL.to_string();
        diag.warnings.push(format!(
            "label missing for catalog number {}; using {UNKNOWN_LABEL}",
            edition.catalog_number
        ));
    }

    if edition.label.is_empty() {
        diag.errors
            .push(FieldError::optional("label", "no label found"));
    }
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

fn check_invariants(album: &Album, diag: &mut Diagnostics) {
    if !album.has_title() {
        diag.errors.push(missing_title());
    }
    if album.original_year == 0 {
        diag.errors.push(missing_year());
    }
    if album.tracks.is_empty() {
        diag.errors
            .push(FieldError::required("tracks", "no tracks found"));
        return;
    }

    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    let mut last_on_disc: HashMap<u32, u32> = HashMap::new();

    for track in &album.tracks {
        if track.composer().is_none() {
            diag.errors.push(missing_composer(track.disc, track.track));
        }

        if !seen.insert((track.disc, track.track)) {
            diag.errors.push(FieldError::required(
                "track",
                format!("duplicate disc {} track {}", track.disc, track.track),
            ));
            continue;
        }

        match last_on_disc.get(&track.disc).copied() {
            None if track.track != 1 => diag
                .notes
                .push(format!("disc {} starts at track {}", track.disc, track.track)),
            None => {}
            Some(previous) if track.track <= previous => diag.warnings.push(format!(
                "disc {}: track {} follows track {previous} out of order",
                track.disc, track.track
            )),
            Some(previous) if track.track > previous + 1 => diag.notes.push(format!(
                "disc {}: gap between track {previous} and track {}",
                track.disc, track.track
            )),
            Some(_) => {}
        }
        let entry = last_on_disc.entry(track.disc).or_insert(track.track);
        *entry = (*entry).max(track.track);
    }
}

/// Convenience for callers holding a bare album (e.g. decoded JSON).
pub fn normalize_album(album: Album, source: &str) -> ExtractionResult {
    normalize(ExtractionResult::new(album, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Edition;

    fn track(n: u32, composer: &str, performers: &[(&str, Role)]) -> Track {
        let mut t = Track::new(1, n, format!("Track {n}")).with_artist(Artist::composer(composer));
        for (name, role) in performers {
            t = t.with_artist(Artist::new(*name, *role));
        }
        t
    }

    fn album_with(tracks: Vec<Track>) -> Album {
        let mut album = Album::new("Partitas", 1957);
        album.edition = Some(Edition::new("Columbia", "ML 5472", 1957));
        album.tracks = tracks;
        album
    }

    #[test]
    fn test_unknown_track_roles_become_soloist_and_promoted() {
        let album = album_with(vec![
            track(1, "Bach", &[("Glenn Gould", Role::Unknown)]),
            track(2, "Bach", &[("Glenn Gould", Role::Unknown)]),
            track(3, "Bach", &[("Glenn Gould", Role::Unknown)]),
        ]);
        let result = normalize_album(album, "tags");
        let album = result.album();
        assert_eq!(album.album_artist, vec![Artist::new("Glenn Gould", Role::Soloist)]);
        for t in &album.tracks {
            assert!(t.has_artist(&Artist::new("Glenn Gould", Role::Soloist)));
            assert_eq!(t.artists.len(), 2);
        }
        assert!(!result.has_required_errors());
        assert_eq!(result.stage(), Stage::Normalized);
    }

    #[test]
    fn test_album_artist_roles_upgraded_from_tracks() {
        let mut album = album_with(vec![
            track(1, "Brahms", &[("Emil Gilels", Role::Soloist)]),
            track(2, "Brahms", &[("Emil Gilels", Role::Soloist)]),
        ]);
        album.album_artist = vec![Artist::unknown("Emil Gilels")];
        let result = normalize_album(album, "tags");
        assert_eq!(
            result.album().album_artist,
            vec![Artist::new("Emil Gilels", Role::Soloist)]
        );
    }

    #[test]
    fn test_album_artist_union_when_names_differ() {
        let mut album = album_with(vec![
            track(1, "Brahms", &[("Emil Gilels", Role::Soloist)]),
            track(2, "Brahms", &[("Emil Gilels", Role::Soloist)]),
        ]);
        album.album_artist = vec![Artist::new("Berliner Philharmoniker", Role::Ensemble)];
        let result = normalize_album(album, "tags");
        let names: Vec<&str> = result
            .album()
            .album_artist
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["Berliner Philharmoniker", "Emil Gilels"]);
        assert!(result.warnings().iter().any(|w| w.contains("differ")));
    }

    #[test]
    fn test_album_artists_propagate_to_every_track() {
        let mut album = album_with(vec![track(1, "Poulenc", &[]), track(2, "Gruber", &[])]);
        album.album_artist = vec![
            Artist::new("RIAS Kammerchor", Role::Ensemble),
            Artist::new("Marcus Creed", Role::Conductor),
        ];
        let result = normalize_album(album, "discogs");
        for t in &result.album().tracks {
            assert!(t.has_artist(&Artist::new("RIAS Kammerchor", Role::Ensemble)));
            assert!(t.has_artist(&Artist::new("Marcus Creed", Role::Conductor)));
        }
    }

    #[test]
    fn test_various_artists_is_not_propagated() {
        let mut album = album_with(vec![track(1, "Poulenc", &[]), track(2, "Gruber", &[])]);
        album.album_artist = vec![Artist::new(VARIOUS_ARTISTS, Role::Ensemble)];
        let result = normalize_album(album, "discogs");
        for t in &result.album().tracks {
            assert_eq!(t.artists.len(), 1);
        }
    }

    #[test]
    fn test_same_name_different_roles_preserved() {
        let mut album = album_with(vec![
            track(1, "Leonard Bernstein", &[("Leonard Bernstein", Role::Conductor)]),
            track(2, "Leonard Bernstein", &[("Leonard Bernstein", Role::Conductor)]),
        ]);
        album.album_artist = vec![Artist::new("Leonard Bernstein", Role::Conductor)];
        let result = normalize_album(album, "tags");
        let t = &result.album().tracks[0];
        assert!(t.has_artist(&Artist::composer("Leonard Bernstein")));
        assert!(t.has_artist(&Artist::new("Leonard Bernstein", Role::Conductor)));
    }

    #[test]
    fn test_edition_year_synthesized_from_original_year() {
        let mut album = album_with(vec![track(1, "Bach", &[])]);
        album.edition = Some(Edition::new("", "SK 37779", 0));
        let result = normalize_album(album, "tags");
        let edition = result.album().edition.clone().unwrap();
        assert_eq!(edition.year, 1957);
        assert_eq!(edition.label, UNKNOWN_LABEL);
        assert_eq!(result.warnings().len(), 2);
    }

    #[test]
    fn test_edition_year_placeholder_without_original_year() {
        let mut album = album_with(vec![track(1, "Bach", &[])]);
        album.original_year = 0;
        album.edition = Some(Edition::new("Sony", "SK 37779", 0));
        let result = normalize_album(album, "tags");
        assert_eq!(
            result.album().edition.as_ref().unwrap().year,
            PLACEHOLDER_EDITION_YEAR
        );
        assert!(result.has_error_for("original_year"));
    }

    #[test]
    fn test_missing_composer_reported_once() {
        let album = album_with(vec![
            Track::new(1, 1, "Anon"),
            track(2, "Bach", &[]),
        ]);
        let result = ExtractionResult::new(album, "tags").with_error(missing_composer(1, 1));
        let result = normalize(result);
        let composer_errors: Vec<_> = result
            .errors()
            .iter()
            .filter(|e| e.field == "composer")
            .collect();
        assert_eq!(composer_errors.len(), 1);
        assert!(composer_errors[0].required);
    }

    #[test]
    fn test_duplicate_track_numbers_are_required_errors() {
        let album = album_with(vec![track(1, "Bach", &[]), track(1, "Bach", &[])]);
        let result = normalize_album(album, "tags");
        assert!(result
            .errors()
            .iter()
            .any(|e| e.field == "track" && e.message == "duplicate disc 1 track 1"));
    }

    #[test]
    fn test_gaps_are_noted_not_errors() {
        let album = album_with(vec![track(1, "Bach", &[]), track(4, "Bach", &[])]);
        let result = normalize_album(album, "tags");
        assert!(!result.has_required_errors());
        assert!(result.notes().iter().any(|n| n.contains("gap")));
    }

    #[test]
    fn test_empty_tracks_is_required_error() {
        let result = normalize_album(album_with(Vec::new()), "presto");
        assert!(result.has_error_for("tracks"));
    }

    #[test]
    fn test_extra_composers_dropped_with_warning() {
        let album = album_with(vec![track(1, "Bach", &[("Busoni", Role::Composer)])]);
        let result = normalize_album(album, "tags");
        let t = &result.album().tracks[0];
        assert_eq!(t.artists.iter().filter(|a| a.is_composer()).count(), 1);
        assert_eq!(t.composer().unwrap().name, "Bach");
        assert!(result.warnings().iter().any(|w| w.contains("Busoni")));
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let album = album_with(vec![
            track(1, "Bach", &[("Glenn Gould", Role::Unknown), ("Anon Ensemble", Role::Unknown)]),
            track(2, "Bach", &[("Glenn Gould", Role::Unknown)]),
        ]);
        let a = normalize_album(album.clone(), "tags");
        let b = normalize_album(album, "tags");
        assert_eq!(a, b);
    }
}
