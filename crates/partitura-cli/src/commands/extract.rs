use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use partitura_core::codec;
use partitura_extract::{
    Config, ExtractError, ExtractResult, HtmlSource, HttpFetcher, Pipeline, Source,
};

use super::report;

/// Extractor selection on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceKind {
    /// Directories use tags; files are sniffed for Presto or Discogs markup
    Auto,
    Tags,
    Presto,
    Discogs,
}

impl SourceKind {
    const fn html(self) -> Option<HtmlSource> {
        match self {
            Self::Presto => Some(HtmlSource::Presto),
            Self::Discogs => Some(HtmlSource::Discogs),
            Self::Auto | Self::Tags => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Path(PathBuf),
    Url(String),
}

#[derive(Debug)]
pub struct ExtractArgs {
    pub input: Input,
    pub source: SourceKind,
    pub output: Option<PathBuf>,
    pub force: bool,
}

/// Run one extraction and print the JSON and the report.
pub async fn run(args: ExtractArgs, config: Config) -> Result<ExitCode> {
    let source = match resolve_source(&args.input, args.source, &config).await {
        Ok(source) => source,
        Err(e) => return Ok(report::terminal(&e)),
    };

    let pipeline = Pipeline::new(config);
    let result = match pipeline.run(&source) {
        Ok(result) => result,
        Err(e) => return Ok(report::terminal(&e)),
    };
    let (json, result) = Pipeline::emit(result).context("Failed to serialize album")?;

    report::print(&result);
    let writable = report::may_write(&result, args.force);
    match &args.output {
        Some(path) if writable => {
            codec::write_file(path, result.album())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("✓ Wrote {}", path.display());
        }
        Some(path) => {
            eprintln!(
                "Not writing {}: required fields are missing (use --force to override)",
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(report::exit_code(&result, args.force))
}

async fn resolve_source(input: &Input, kind: SourceKind, config: &Config) -> ExtractResult<Source> {
    match input {
        Input::Url(url) => {
            if kind == SourceKind::Tags {
                return Err(ExtractError::Unsupported {
                    message: "the tag source reads directories, not URLs".to_string(),
                });
            }
            let page = HttpFetcher::new(config)?.fetch(url).await?;
            Source::html(page.body, kind.html())
        }
        Input::Path(path) => source_from_path(path, kind),
    }
}

fn source_from_path(path: &Path, kind: SourceKind) -> ExtractResult<Source> {
    if kind == SourceKind::Tags || (kind == SourceKind::Auto && path.is_dir()) {
        return Ok(Source::Tags(path.to_path_buf()));
    }
    let body = std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Source::html(body, kind.html())
}
