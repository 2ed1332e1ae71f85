// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{NotifierKind, RuntimeSelector};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(333);
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// jruby = false
/// java = "java"
/// jruby_complete = "vendors/jruby-complete.jar"
/// runners_dir = "runners"
/// jvm_opts = ["-Xms256m"]
///
/// [watch]
/// notifier = "poll"
/// poll_interval = "333ms"
/// debounce = "200ms"
/// grace_period = "3s"
/// patterns = ["**/*.rb", "**/*.glsl"]
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Launch sketches with a system `jruby` instead of `jruby-complete`.
    #[serde(default)]
    pub jruby: bool,

    #[serde(default)]
    pub java: Option<String>,

    #[serde(default)]
    pub jruby_bin: Option<String>,

    /// Path to `jruby-complete.jar`. Relative paths resolve against the
    /// directory holding the config file.
    #[serde(default)]
    pub jruby_complete: Option<PathBuf>,

    /// Directory holding the `run.rb` / `live.rb` entry scripts.
    #[serde(default)]
    pub runners_dir: Option<PathBuf>,

    /// JVM options added before the entry script.
    #[serde(default)]
    pub jvm_opts: Vec<String>,

    /// External installer used by `rp5 setup install|unpack-samples`.
    #[serde(default)]
    pub installer: Option<PathBuf>,

    #[serde(default)]
    pub watch: RawWatchSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawWatchSection {
    #[serde(default)]
    pub notifier: NotifierKind,

    /// Duration string such as `"333ms"` or `"1s"`.
    #[serde(default)]
    pub poll_interval: Option<String>,

    #[serde(default)]
    pub debounce: Option<String>,

    #[serde(default)]
    pub grace_period: Option<String>,

    /// Also track files next to the sketch (matching `patterns`).
    #[serde(default)]
    pub watch_dir: Option<bool>,

    #[serde(default)]
    pub patterns: Option<Vec<String>>,

    /// Ignore modifications that leave the content hash unchanged.
    #[serde(default)]
    pub use_hash: bool,
}

/// Validated configuration passed explicitly into commands and the
/// supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rp5Config {
    pub jruby: bool,
    pub java: String,
    pub jruby_bin: String,
    pub jruby_complete: PathBuf,
    pub runners_dir: PathBuf,
    pub jvm_opts: Vec<String>,
    pub installer: Option<PathBuf>,
    pub watch: WatchSettings,
}

/// Watch-mode tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSettings {
    pub notifier: NotifierKind,
    pub poll_interval: Duration,
    pub debounce: Duration,
    pub grace_period: Duration,
    pub watch_dir: bool,
    pub patterns: Vec<String>,
    pub use_hash: bool,
}

pub fn default_patterns() -> Vec<String> {
    vec!["**/*.rb".to_string(), "**/*.glsl".to_string()]
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            notifier: NotifierKind::Poll,
            poll_interval: DEFAULT_POLL_INTERVAL,
            debounce: DEFAULT_DEBOUNCE,
            grace_period: DEFAULT_GRACE_PERIOD,
            watch_dir: true,
            patterns: default_patterns(),
            use_hash: false,
        }
    }
}

impl Default for Rp5Config {
    fn default() -> Self {
        Self {
            jruby: false,
            java: "java".to_string(),
            jruby_bin: "jruby".to_string(),
            jruby_complete: PathBuf::from("vendors/jruby-complete.jar"),
            runners_dir: PathBuf::from("runners"),
            jvm_opts: Vec::new(),
            installer: None,
            watch: WatchSettings::default(),
        }
    }
}

impl Rp5Config {
    /// Runtime used when neither `--jruby` nor `--nojruby` is given.
    pub fn default_runtime(&self) -> RuntimeSelector {
        RuntimeSelector::from_jruby_flag(self.jruby)
    }

    /// Resolve relative paths against `base` (the config file's directory).
    pub fn resolve_relative_to(mut self, base: &std::path::Path) -> Self {
        let resolve = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.jruby_complete = resolve(self.jruby_complete);
        self.runners_dir = resolve(self.runners_dir);
        self.installer = self.installer.map(resolve);
        self
    }
}
