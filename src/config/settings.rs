//! Application settings

use crate::core::engine::Timings;
use crate::core::transport::DEFAULT_BAUD_RATE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Platform has no config directory
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// Reading or writing the file failed
    #[error("Config file {path}: {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid config TOML
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// Config file
        path: PathBuf,
        /// TOML error with position
        #[source]
        source: toml::de::Error,
    },

    /// Config could not be rendered
    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Serial defaults
    pub serial: SerialSettings,
    /// Transaction timing
    pub timing: TimingSettings,
    /// Batch pacing
    pub batch: BatchSettings,
    /// Simulated modem
    pub simulator: SimulatorSettings,
}

impl AppConfig {
    /// Load config from the default location.
    ///
    /// A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = super::config_path().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&path)
    }

    /// Load config from a file, falling back to defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = super::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to a file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, content).map_err(io_err)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Serial defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Port used when none is given on the command line
    pub port: Option<String>,
    /// Baud rate
    pub baud_rate: u32,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Transaction timing in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Per-read wait
    pub poll_timeout_ms: u64,
    /// Silence that ends a response
    pub idle_gap_ms: u64,
    /// Hard limit for one transaction
    pub deadline_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 200,
            idle_gap_ms: 350,
            deadline_ms: 10_000,
        }
    }
}

impl From<&TimingSettings> for Timings {
    fn from(t: &TimingSettings) -> Self {
        Timings::from_millis(t.poll_timeout_ms, t.idle_gap_ms, t.deadline_ms)
    }
}

/// Batch pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Pause between consecutive commands
    pub delay_ms: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self { delay_ms: 250 }
    }
}

/// Simulated modem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorSettings {
    /// Fixed RNG seed for reproducible signal reports
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.batch.delay_ms, 250);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let contents = "[serial]\nport = \"/dev/ttyUSB0\"\n\n[timing]\nidle_gap_ms = 500\n";
        std::fs::write(&path, contents).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.serial.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.timing.idle_gap_ms, 500);
        assert_eq!(config.timing.poll_timeout_ms, 200);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.simulator.seed = Some(7);
        config.batch.delay_ms = 0;
        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[timing]\nidle_gap_ms = \"soon\"\n").unwrap();

        assert!(matches!(AppConfig::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_timings_from_settings() {
        let timings = Timings::from(&TimingSettings::default());
        assert_eq!(timings, Timings::default());
        assert_eq!(timings.idle_gap, Duration::from_millis(350));
    }
}
