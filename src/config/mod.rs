//! Configuration module
//!
//! Handles application settings stored as TOML in the platform config dir

mod settings;

pub use settings::{
    AppConfig, BatchSettings, ConfigError, SerialSettings, SimulatorSettings, TimingSettings,
};

use directories::ProjectDirs;
use std::path::PathBuf;

/// Config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the application configuration directory
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "atbench", "atbench").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}
