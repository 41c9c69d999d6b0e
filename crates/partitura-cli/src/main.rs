use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use partitura_extract::Config;

mod commands;

use commands::extract::{ExtractArgs, Input, SourceKind};

#[derive(Debug, Parser)]
#[command(name = "partitura", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Extract album metadata and print canonical JSON
    ///
    /// PATH is either an album directory of tagged FLAC files or a saved
    /// Presto Music / Discogs release page. With --url the page is fetched
    /// instead.
    ///
    /// The JSON goes to stdout (or to --output). Missing fields, warnings
    /// and a summary go to stderr. Without --force, an album with missing
    /// required fields (title, year, composers) exits non-zero and is not
    /// written to --output.
    Extract {
        /// Album directory or HTML file
        #[arg(required_unless_present = "url")]
        path: Option<PathBuf>,

        /// Which extractor to use
        #[arg(long, value_enum, default_value_t = SourceKind::Auto)]
        source: SourceKind,

        /// Fetch a release page instead of reading PATH
        #[arg(long, conflicts_with = "path")]
        url: Option<String>,

        /// Write the JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write output even when required fields are missing
        #[arg(long)]
        force: bool,
    },
    /// Re-check a canonical JSON file
    ///
    /// Accepts both the current shape and the older shape with a separate
    /// composer object per track.
    Check {
        /// Path to the JSON file
        json: PathBuf,

        /// Exit zero even when required fields are missing
        #[arg(long)]
        force: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Create the config file with defaults
    Init,
    /// Print an example config file
    Example,
}

fn log_filter(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => std::env::var("RUST_LOG")
            .ok()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| {
                if configured.trim().is_empty() {
                    "warn".to_string()
                } else {
                    configured.to_string()
                }
            }),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load()?;

    env_logger::Builder::new()
        .parse_filters(&log_filter(cli.verbose, &config.log_level))
        .init();

    match cli.command {
        Commands::Extract {
            path,
            source,
            url,
            output,
            force,
        } => {
            let input = match (path, url) {
                (_, Some(url)) => Input::Url(url),
                (Some(path), None) => Input::Path(path),
                (None, None) => anyhow::bail!("either PATH or --url is required"),
            };
            let force = force || config.force;
            let args = ExtractArgs {
                input,
                source,
                output,
                force,
            };
            commands::extract::run(args, config).await
        }
        Commands::Check { json, force } => commands::check::run(&json, force || config.force),
        Commands::Config { action } => {
            match action {
                ConfigAction::Show => commands::config::show_config()?,
                ConfigAction::Path => commands::config::show_path()?,
                ConfigAction::Init => commands::config::init_config()?,
                ConfigAction::Example => commands::config::show_example()?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbose_wins_over_config() {
        assert_eq!(log_filter(1, "error"), "info");
        assert_eq!(log_filter(2, "error"), "debug");
        assert_eq!(log_filter(5, "error"), "trace");
    }

    #[test]
    fn test_extract_arguments() {
        let cli = Cli::try_parse_from([
            "partitura", "-v", "extract", "page.html", "--source", "discogs", "-o", "out.json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Extract {
                path,
                source,
                output,
                force,
                ..
            } => {
                assert_eq!(path, Some(PathBuf::from("page.html")));
                assert_eq!(source, SourceKind::Discogs);
                assert_eq!(output, Some(PathBuf::from("out.json")));
                assert!(!force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_extract_needs_path_or_url() {
        assert!(Cli::try_parse_from(["partitura", "extract"]).is_err());
        assert!(Cli::try_parse_from(["partitura", "extract", "--url", "https://x"]).is_ok());
    }
}
