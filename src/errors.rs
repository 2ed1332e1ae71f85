// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::launch::ChildHandle;

#[derive(Error, Debug)]
pub enum Rp5Error {
    #[error("sketch not found: {}", .0.display())]
    SketchNotFound(PathBuf),

    #[error("runtime unavailable: '{program}' could not be found (check PATH or your rp5 config)")]
    RuntimeUnavailable { program: String },

    #[error("failed to launch '{program}': {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Graceful termination exceeded the grace period. Recovered locally by a
    /// forced kill; only ever logged.
    #[error("child {child} still running {grace:?} after graceful termination")]
    TerminationTimeout { child: ChildHandle, grace: Duration },

    #[error("sketch already exists: {}", .0.display())]
    SketchExists(PathBuf),

    #[error("invalid sketch name '{0}': use letters, digits, '_' or '-', starting with a letter")]
    InvalidSketchName(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Rp5Error>;
