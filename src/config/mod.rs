// src/config/mod.rs

//! Configuration loading and validation for rp5.
//!
//! - `model.rs`: the TOML-backed raw model and the validated `Rp5Config`.
//! - `loader.rs`: locating and reading the config file.
//! - `validate.rs`: durations, patterns and other sanity checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, resolve_config};
pub use model::{RawConfigFile, RawWatchSection, Rp5Config, WatchSettings};
pub use validate::parse_duration;
