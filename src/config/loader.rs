// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawConfigFile, Rp5Config};
use crate::errors::{Result, Rp5Error};

/// File name looked up in the home directory when no config is given.
pub const HOME_CONFIG_NAME: &str = ".rp5rc.toml";

/// Load a configuration file and return the raw, unvalidated model.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file, validate it and resolve relative paths against
/// the file's directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Rp5Config> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let config = Rp5Config::try_from(raw)?;
    Ok(config.resolve_relative_to(&config_root_dir(path)))
}

/// Default config location: `RP5_CONFIG`, then `~/.rp5rc.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("RP5_CONFIG") {
        return Some(PathBuf::from(path));
    }
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join(HOME_CONFIG_NAME))
}

/// Resolve the effective configuration.
///
/// An explicit `--config` path must exist. The default location is optional;
/// when absent the built-in defaults apply.
pub fn resolve_config(explicit: Option<&Path>) -> Result<Rp5Config> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(Rp5Error::ConfigError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return load_and_validate(path);
    }

    match default_config_path() {
        Some(path) if path.is_file() => {
            debug!(path = %path.display(), "loading default config");
            load_and_validate(&path)
        }
        _ => {
            debug!("no config file found; using defaults");
            Ok(Rp5Config::default())
        }
    }
}

fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
