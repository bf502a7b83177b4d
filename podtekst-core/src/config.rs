//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/podtekst/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/podtekst/` (~/.config/podtekst/)
//! - Data: `$XDG_DATA_HOME/podtekst/` (~/.local/share/podtekst/)
//! - State/Logs: `$XDG_STATE_HOME/podtekst/` (~/.local/state/podtekst/)

use crate::error::{Error, Result};
use crate::fingerprint::FingerprintAlgorithm;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Aggregator tuning
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Fingerprint settings
    #[serde(default)]
    pub fingerprint: FingerprintConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Aggregator configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Gap after which the next message starts a new session
    #[serde(default = "default_session_gap_minutes")]
    pub session_gap_minutes: u32,

    /// First UTC hour counted as late night (inclusive)
    #[serde(default = "default_late_night_start")]
    pub late_night_start_hour: u32,

    /// UTC hour at which late night ends (exclusive)
    #[serde(default = "default_late_night_end")]
    pub late_night_end_hour: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            session_gap_minutes: default_session_gap_minutes(),
            late_night_start_hour: default_late_night_start(),
            late_night_end_hour: default_late_night_end(),
        }
    }
}

impl AnalysisConfig {
    /// Session gap in milliseconds.
    pub fn session_gap_ms(&self) -> i64 {
        i64::from(self.session_gap_minutes) * 60_000
    }

    /// Whether a UTC hour falls in the late-night window.
    ///
    /// The window wraps midnight when start > end (22..4).
    pub fn is_late_night(&self, hour: u32) -> bool {
        let (start, end) = (self.late_night_start_hour, self.late_night_end_hour);
        if start <= end {
            hour >= start && hour < end
        } else {
            hour >= start || hour < end
        }
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.session_gap_minutes == 0 {
            return Err(Error::Config(
                "analysis.session_gap_minutes must be greater than 0".to_string(),
            ));
        }
        if self.late_night_start_hour > 23 || self.late_night_end_hour > 23 {
            return Err(Error::Config(
                "analysis late-night hours must be between 0 and 23".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_session_gap_minutes() -> u32 {
    360
}

fn default_late_night_start() -> u32 {
    22
}

fn default_late_night_end() -> u32 {
    4
}

/// Fingerprint configuration
#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct FingerprintConfig {
    /// `sha256` (default) or `simple`
    #[serde(default)]
    pub algorithm: FingerprintAlgorithm,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.analysis.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/podtekst/config.toml` (~/.config/podtekst/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("podtekst").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/podtekst/` (~/.local/share/podtekst/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("podtekst")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/podtekst/` (~/.local/state/podtekst/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("podtekst")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/podtekst/analyses.db`
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("analyses.db")
    }
}
