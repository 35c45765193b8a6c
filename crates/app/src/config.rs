//! Host configuration
//!
//! Read from `standup.toml` in the platform config directory, or from the
//! file named by `STANDUP_CONFIG`. Every key is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use standup_core::Timings;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "STANDUP_CONFIG";

const CONFIG_FILE: &str = "standup.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address used when none is given on the command line
    pub base_url: Option<String>,
    pub selection_window_ms: u64,
    pub highlight_tick_ms: u64,
    pub timer_start_delay_ms: u64,
    pub acknowledged_grace_ms: u64,
    pub timer_tick_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let timings = Timings::default();
        Self {
            base_url: None,
            selection_window_ms: millis(timings.selection_window),
            highlight_tick_ms: millis(timings.highlight_tick),
            timer_start_delay_ms: millis(timings.timer_start_delay),
            acknowledged_grace_ms: millis(timings.acknowledged_grace),
            timer_tick_ms: millis(timings.timer_tick),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl AppConfig {
    /// Load from the usual place. Problems are logged and defaults used.
    pub fn load() -> Self {
        let path = match config_path() {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "Using default configuration");
                return Self::default();
            }
        };

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Using default configuration");
                Self::default()
            }
        }
    }

    /// Load from `path`. A missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Delays for the session. Zero intervals fall back to the defaults.
    pub fn timings(&self) -> Timings {
        let defaults = Timings::default();
        let pick = |ms: u64, fallback: Duration| {
            if ms == 0 {
                fallback
            } else {
                Duration::from_millis(ms)
            }
        };

        Timings {
            selection_window: pick(self.selection_window_ms, defaults.selection_window),
            highlight_tick: pick(self.highlight_tick_ms, defaults.highlight_tick),
            timer_start_delay: Duration::from_millis(self.timer_start_delay_ms),
            acknowledged_grace: Duration::from_millis(self.acknowledged_grace_ms),
            timer_tick: pick(self.timer_tick_ms, defaults.timer_tick),
        }
    }
}

fn config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let dirs = ProjectDirs::from("dev", "standup", "standup").ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.config_dir().join(CONFIG_FILE))
}
