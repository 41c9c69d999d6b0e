//! Diagnostics printed to stderr after an extraction or check.

use std::collections::HashSet;
use std::process::ExitCode;

use partitura_core::{ExtractionResult, FieldError};
use partitura_extract::ExtractError;

/// One report line for a field error.
pub fn format_error(error: &FieldError) -> String {
    let level = if error.required { "[required]" } else { "[optional]" };
    format!("{level} {}: {}", error.field, error.message)
}

/// Summary line with counts.
pub fn summary(result: &ExtractionResult) -> String {
    let required = result.required_errors().count();
    let optional = result.errors().len() - required;
    format!(
        "{}: '{}' with {} tracks, {required} required, {optional} optional, {} warnings",
        result.source(),
        result.album().title,
        result.album().tracks.len(),
        unique_warnings(result).len()
    )
}

fn unique_warnings(result: &ExtractionResult) -> Vec<&str> {
    let mut seen = HashSet::new();
    result
        .warnings()
        .iter()
        .map(String::as_str)
        .filter(|w| seen.insert(*w))
        .collect()
}

/// Print every error and warning once, then the summary.
pub fn print(result: &ExtractionResult) {
    for error in result.errors() {
        eprintln!("{}", format_error(error));
    }
    for warning in unique_warnings(result) {
        eprintln!("[warning] {warning}");
    }
    for note in result.notes() {
        log::info!("{note}");
    }
    eprintln!("{}", summary(result));
}

/// Report a terminal error and return the failing exit code.
pub fn terminal(error: &ExtractError) -> ExitCode {
    eprintln!("{}: {error}", error.kind());
    ExitCode::FAILURE
}

/// Whether output may be persisted.
pub fn may_write(result: &ExtractionResult, force: bool) -> bool {
    force || !result.has_required_errors()
}

pub fn exit_code(result: &ExtractionResult, force: bool) -> ExitCode {
    if may_write(result, force) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
