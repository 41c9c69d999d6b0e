use anyhow::Result;
use std::path::Path;
use std::process::ExitCode;

use partitura_core::{codec, ExtractionResult};
use partitura_extract::ExtractError;

use super::report;

/// Re-run the normalizer checks over an emitted JSON file.
pub fn run(path: &Path, force: bool) -> Result<ExitCode> {
    match check_file(path) {
        Ok(result) => {
            report::print(&result);
            Ok(report::exit_code(&result, force))
        }
        Err(e) => Ok(report::terminal(&e)),
    }
}

fn check_file(path: &Path) -> Result<ExtractionResult, ExtractError> {
    log::debug!("checking {}", path.display());
    let album = codec::read_file(path)?;
    Ok(partitura_core::normalize(ExtractionResult::new(album, "json")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use partitura_core::{Album, Artist, Track};
    use tempfile::TempDir;

    #[test]
    fn test_check_complete_album() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("album.json");
        let mut album = Album::new("Goldberg Variations", 1981);
        album
            .tracks
            .push(Track::new(1, 1, "Aria").with_artist(Artist::composer("Bach")));
        codec::write_file(&path, &album).unwrap();

        let result = check_file(&path).unwrap();
        assert!(report::may_write(&result, false), "{:?}", result.errors());
    }

    #[test]
    fn test_check_missing_composer_needs_force() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("album.json");
        let mut album = Album::new("Goldberg Variations", 1981);
        album.tracks.push(Track::new(1, 1, "Aria"));
        codec::write_file(&path, &album).unwrap();

        let result = check_file(&path).unwrap();
        assert!(result.has_error_for("composer"));
        assert!(!report::may_write(&result, false));
        assert!(report::may_write(&result, true));
    }

    #[test]
    fn test_check_unreadable_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("album.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = check_file(&path).unwrap_err();
        assert_eq!(err.kind(), "ParseError");
    }
}
