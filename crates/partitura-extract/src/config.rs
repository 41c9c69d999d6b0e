use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for partitura.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (PARTITURA_* prefix)
/// 3. Config file (~/.config/partitura/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Default log filter when neither `-v` nor `RUST_LOG` is given.
    ///
    /// Can be set via:
    /// - ENV: PARTITURA_LOG_LEVEL
    /// - Config: log_level = "info"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// User agent sent when fetching album pages.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for a single page fetch, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// File extensions the tag source reads (case-insensitive, no dot).
    #[serde(default = "default_audio_extensions")]
    pub audio_extensions: Vec<String>,

    /// Write output even when required fields are missing.
    ///
    /// Can be set via:
    /// - CLI: --force
    /// - ENV: PARTITURA_FORCE
    /// - Config: force = true
    #[serde(default)]
    pub force: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            user_agent: default_user_agent(),
            http_timeout_secs: default_http_timeout_secs(),
            audio_extensions: default_audio_extensions(),
            force: false,
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/partitura/config.toml
    /// Reads environment variables with PARTITURA_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new()
            .context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path.to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder.add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("partitura");
        builder.add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build()
            .context("Failed to build configuration")?;

        log::debug!("loaded configuration: {config:?}");
        Ok(config)
    }

    /// Whether `ext` is one of the configured audio extensions.
    pub fn is_audio_extension(&self, ext: &str) -> bool {
        self.audio_extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_user_agent() -> String {
    format!("partitura/{}", env!("CARGO_PKG_VERSION"))
}

const fn default_http_timeout_secs() -> u64 {
    30
}

fn default_audio_extensions() -> Vec<String> {
    vec!["flac".to_string()]
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/partitura/config.toml
/// - macOS: ~/Library/Application Support/partitura/config.toml
/// - Windows: %APPDATA%\partitura\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("partitura")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Partitura Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (PARTITURA_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Default log level: error, warn, info, debug or trace
#
# Overridden by RUST_LOG and by -v on the command line.
# Environment: PARTITURA_LOG_LEVEL=info
log_level = "warn"

# User agent sent when fetching Presto or Discogs pages with --url
user_agent = "partitura/0.1.0"

# Timeout for a page fetch, in seconds
http_timeout_secs = 30

# Audio file extensions read from album directories
audio_extensions = ["flac"]

# Write JSON even when required fields (composer, title, year) are missing
#
# Can also be set via:
# - CLI: partitura extract --force ...
# - Environment: PARTITURA_FORCE=true
force = false
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config())
        .context("Failed to write config file")?;

    Ok(true)
}
