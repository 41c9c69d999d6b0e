use partitura_core::{Album, ExtractionResult, FieldError};

/// Diagnostics gathered while an extractor builds its draft album.
///
/// Extractors push into this as they go and freeze everything into an
/// [`ExtractionResult`] once at the end.
#[derive(Debug, Default)]
pub(crate) struct Draft {
    errors: Vec<FieldError>,
    warnings: Vec<String>,
    notes: Vec<String>,
}

impl Draft {
    pub(crate) fn error(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub(crate) fn warn(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        log::debug!("warning: {warning}");
        self.warnings.push(warning);
    }

    pub(crate) fn warn_all(&mut self, warnings: impl IntoIterator<Item = String>) {
        for warning in warnings {
            self.warn(warning);
        }
    }

    pub(crate) fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub(crate) fn finish(self, album: Album, source: &str) -> ExtractionResult {
        let result = self
            .errors
            .into_iter()
            .fold(ExtractionResult::new(album, source), ExtractionResult::with_unique_error);
        self.notes
            .into_iter()
            .fold(result, ExtractionResult::with_note)
            .with_warnings(self.warnings)
    }
}
