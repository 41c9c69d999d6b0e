//! The immutable container every extractor hands back.
//!
//! An [`ExtractionResult`] bundles the album with every diagnostic the
//! extraction produced. All `with_*` operations consume the result and
//! return a new one; nothing is mutated behind a shared reference.

use std::fmt;

use crate::model::Album;

/// Where a result sits in the extraction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Read,
    Parse,
    DraftBuilt,
    Normalized,
    Emitted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "READ",
            Self::Parse => "PARSE",
            Self::DraftBuilt => "DRAFT_BUILT",
            Self::Normalized => "NORMALIZED",
            Self::Emitted => "EMITTED",
        })
    }
}

/// A missing or unusable field.
///
/// `required = true` is a `RequiredFieldMissing`; otherwise the entry is
/// an `OptionalFieldMissing`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub required: bool,
}

impl FieldError {
    #[must_use]
    pub fn required(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            required: true,
        }
    }

    #[must_use]
    pub fn optional(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            required: false,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.required { "required" } else { "optional" };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

/// An album plus the errors, warnings and notes gathered building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    album: Album,
    source: String,
    stage: Stage,
    errors: Vec<FieldError>,
    warnings: Vec<String>,
    notes: Vec<String>,
}

impl ExtractionResult {
    #[must_use]
    pub fn new(album: Album, source: impl Into<String>) -> Self {
        Self {
            album,
            source: source.into(),
            stage: Stage::DraftBuilt,
            errors: Vec::new(),
            warnings: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn album(&self) -> &Album {
        &self.album
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// True iff any recorded error is required.
    pub fn has_required_errors(&self) -> bool {
        self.errors.iter().any(|e| e.required)
    }

    pub fn required_errors(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter().filter(|e| e.required)
    }

    /// Whether an error for `field` has been recorded.
    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    #[must_use]
    pub fn with_album(self, album: Album) -> Self {
        Self { album, ..self }
    }

    #[must_use]
    pub fn with_stage(self, stage: Stage) -> Self {
        Self { stage, ..self }
    }

    #[must_use]
    pub fn with_error(mut self, error: FieldError) -> Self {
        self.errors.push(error);
        self
    }

    /// Record `error` unless an identical entry already exists.
    #[must_use]
    pub fn with_unique_error(self, error: FieldError) -> Self {
        if self.errors.contains(&error) {
            self
        } else {
            self.with_error(error)
        }
    }

    #[must_use]
    pub fn with_required_error(self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.with_error(FieldError::required(field, message))
    }

    #[must_use]
    pub fn with_optional_error(self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.with_error(FieldError::optional(field, message))
    }

    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    #[must_use]
    pub fn with_warnings<I, S>(mut self, warnings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.warnings.extend(warnings.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}
