//! Configuration loading
//!
//! Reads `~/.config/toastq/config.toml`. A missing file is not an error;
//! an unreadable or invalid one falls back to defaults with a warning the
//! caller can surface.

mod types;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::ToastError;

pub use types::{Config, ToastConfig};

const CONFIG_DIR: &str = "toastq";
const CONFIG_FILE: &str = "config.toml";

/// Loaded configuration plus an optional warning describing a fallback
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warning: Option<String>,
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".config").join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load configuration from the default location
pub fn load_config() -> ConfigResult {
    match config_path() {
        Some(path) => load_config_from_path(&path),
        None => ConfigResult::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> ConfigResult {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return ConfigResult::default(),
        Err(e) => return fallback(ToastError::from(e), path),
    };

    match parse_config(&contents) {
        Ok(config) => ConfigResult {
            config,
            warning: None,
        },
        Err(e) => fallback(e, path),
    }
}

/// Parse and validate a TOML configuration document
pub fn parse_config(content: &str) -> Result<Config, ToastError> {
    let config: Config =
        toml::from_str(content).map_err(|e| ToastError::InvalidConfig(e.message().to_string()))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ToastError> {
    if config.toast.limit == 0 {
        return Err(ToastError::InvalidConfig(
            "toast.limit must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn fallback(err: ToastError, path: &Path) -> ConfigResult {
    let warning = format!("{} ({}), using defaults", err, path.display());
    log::warn!("{}", warning);
    ConfigResult {
        config: Config::default(),
        warning: Some(warning),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
