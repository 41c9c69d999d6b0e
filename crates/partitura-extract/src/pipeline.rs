//! The extraction pipeline.
//!
//! One run drives a single source through
//! `READ → PARSE → DRAFT_BUILT → NORMALIZED`, and [`Pipeline::emit`]
//! takes a normalized result to `EMITTED`. Terminal failures can only
//! happen while reading and parsing; after that, problems accrete on the
//! [`ExtractionResult`].

use std::fmt;
use std::path::PathBuf;

use partitura_core::{codec, ExtractionResult, Stage};

use crate::config::Config;
use crate::error::ExtractResult;
use crate::html::{self, discogs, presto, HtmlSource};
use crate::tags::{self, LoftyTagReader, TagReader};

/// Where an album comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A local album directory of tagged audio files.
    Tags(PathBuf),
    /// A Presto Music product page body.
    PrestoHtml(String),
    /// A Discogs release page body.
    DiscogsHtml(String),
}

impl Source {
    /// Wrap an HTML body, detecting the layout when `kind` is `None`.
    pub fn html(body: String, kind: Option<HtmlSource>) -> ExtractResult<Self> {
        let kind = match kind {
            Some(kind) => kind,
            None => html::detect(&body)?,
        };
        log::debug!("html source: {kind}");
        Ok(match kind {
            HtmlSource::Presto => Self::PrestoHtml(body),
            HtmlSource::Discogs => Self::DiscogsHtml(body),
        })
    }

    /// Label recorded on the result.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Tags(_) => tags::SOURCE,
            Self::PrestoHtml(_) => presto::SOURCE,
            Self::DiscogsHtml(_) => discogs::SOURCE,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tags(dir) => write!(f, "tags:{}", dir.display()),
            Self::PrestoHtml(_) | Self::DiscogsHtml(_) => write!(f, "{}:html", self.label()),
        }
    }
}

/// Runs sources through extraction and normalization.
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    reader: Box<dyn TagReader>,
}

impl Pipeline {
    /// A pipeline reading tags from disk with `lofty`.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            reader: Box::new(LoftyTagReader),
        }
    }

    /// Replace the tag reader.
    #[must_use]
    pub fn with_tag_reader(mut self, reader: impl TagReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extract and normalize one source.
    ///
    /// # Errors
    ///
    /// Returns a terminal [`ExtractError`](crate::ExtractError) when the
    /// source cannot be read or parsed.
    pub fn run(&self, source: &Source) -> ExtractResult<ExtractionResult> {
        log::debug!("{source}: {}", Stage::Read);
        let draft = match source {
            Source::Tags(dir) => {
                let files = tags::read_album_dir(dir, self.reader.as_ref(), &self.config)?;
                log::debug!("{source}: {}", Stage::Parse);
                tags::extract_from_files(&tags::folder_name(dir), files)?
            }
            Source::PrestoHtml(body) => {
                log::debug!("{source}: {}", Stage::Parse);
                presto::extract(body)?
            }
            Source::DiscogsHtml(body) => {
                log::debug!("{source}: {}", Stage::Parse);
                discogs::extract(body)?
            }
        };
        log::debug!("{source}: {}", draft.stage());

        let result = partitura_core::normalize(draft);
        log::debug!("{source}: {}", result.stage());
        log::info!(
            "{source}: {} tracks, {} errors, {} warnings",
            result.album().tracks.len(),
            result.errors().len(),
            result.warnings().len()
        );
        Ok(result)
    }

    /// Serialize a normalized result to canonical JSON and mark it emitted.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn emit(result: ExtractionResult) -> ExtractResult<(String, ExtractionResult)> {
        let json = codec::to_json(result.album())?;
        let result = result.with_stage(Stage::Emitted);
        log::debug!("{}: {}", result.source(), result.stage());
        Ok((json, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;

    const PRESTO_PAGE: &str = r#"<html><head><title>Messiah | Presto Music</title></head><body>
<ul class="c-product-block__metadata">
  <li>Release date: 1st Jan 2010</li>
  <li>Label: Linn</li>
  <li>Catalogue number: CKD 285</li>
</ul>
<div class="c-tracklist__work">
  <div class="c-track__title"><a href="/composers/handel">George Frideric Handel</a>:
  <a href="/works/messiah">Messiah: Overture</a></div>
</div>
</body></html>"#;

    #[test]
    fn test_run_presto_reaches_normalized() {
        let pipeline = Pipeline::new(Config::default());
        let source = Source::PrestoHtml(PRESTO_PAGE.to_string());
        let result = pipeline.run(&source).unwrap();
        assert_eq!(result.stage(), Stage::Normalized);
        assert_eq!(result.source(), "presto");
        assert_eq!(result.album().title, "Messiah");
        assert!(!result.has_required_errors(), "{:?}", result.errors());
    }

    #[test]
    fn test_emit_marks_emitted() {
        let pipeline = Pipeline::new(Config::default());
        let result = pipeline
            .run(&Source::PrestoHtml(PRESTO_PAGE.to_string()))
            .unwrap();
        let (json, result) = Pipeline::emit(result).unwrap();
        assert_eq!(result.stage(), Stage::Emitted);
        assert!(json.contains("\"title\": \"Messiah\""));
    }

    #[test]
    fn test_source_html_detection() {
        let source = Source::html(PRESTO_PAGE.to_string(), None).unwrap();
        assert!(matches!(source, Source::PrestoHtml(_)));
        let forced = Source::html(PRESTO_PAGE.to_string(), Some(HtmlSource::Discogs)).unwrap();
        assert_eq!(forced.label(), "discogs");
        assert!(Source::html("<p>hi</p>".to_string(), None).is_err());
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let pipeline = Pipeline::new(Config::default());
        let err = pipeline
            .run(&Source::Tags(PathBuf::from("/nonexistent/partitura/album")))
            .unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }
}
