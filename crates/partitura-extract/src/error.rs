//! Terminal extraction errors.
//!
//! Anything that stops a pipeline run is an [`ExtractError`]. Missing
//! fields and inconsistencies are not errors in this sense; they are
//! accreted on the `ExtractionResult` instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that terminate an extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A file or directory could not be read.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The album directory held no files with a configured audio extension.
    #[error("no audio files found in {}", path.display())]
    NoAudioFiles { path: PathBuf },

    /// Structural failure in a source document or tag block.
    #[error("parse error from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// Input the extractor refuses to handle (e.g. DJ mixes).
    #[error("unsupported input: {message}")]
    Unsupported { message: String },

    /// A fetched page came back with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    Http { url: String, status: u16 },

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// An error propagated from the core domain layer.
    #[error("core error: {0}")]
    Core(#[from] partitura_core::Error),
}

impl ExtractError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(source_name: &str, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    /// The taxonomy label reported to users.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. }
            | Self::NoAudioFiles { .. }
            | Self::Http { .. }
            | Self::Request(_) => "IOError",
            Self::Parse { .. } => "ParseError",
            Self::Unsupported { .. } => "Unsupported",
            Self::Core(partitura_core::Error::Io(_)) => "IOError",
            Self::Core(_) => "ParseError",
        }
    }
}

/// Convenience alias for extraction results.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;
