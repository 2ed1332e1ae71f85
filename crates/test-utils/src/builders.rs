#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rp5::config::{Rp5Config, WatchSettings};
use rp5::types::NotifierKind;
use rp5::watch::Fingerprint;

/// Builder for `Rp5Config` to simplify test setup.
pub struct ConfigBuilder {
    config: Rp5Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Rp5Config {
                watch: test_settings(),
                ..Rp5Config::default()
            },
        }
    }

    pub fn with_jruby(mut self, jruby: bool) -> Self {
        self.config.jruby = jruby;
        self
    }

    pub fn with_runners_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.runners_dir = dir.into();
        self
    }

    pub fn with_jruby_complete(mut self, jar: impl Into<PathBuf>) -> Self {
        self.config.jruby_complete = jar.into();
        self
    }

    pub fn with_jvm_opt(mut self, opt: &str) -> Self {
        self.config.jvm_opts.push(opt.to_string());
        self
    }

    pub fn with_installer(mut self, installer: impl Into<PathBuf>) -> Self {
        self.config.installer = Some(installer.into());
        self
    }

    pub fn with_watch(mut self, watch: WatchSettings) -> Self {
        self.config.watch = watch;
        self
    }

    pub fn build(self) -> Rp5Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Watch settings with short timings so tests finish quickly.
pub fn test_settings() -> WatchSettings {
    WatchSettings {
        notifier: NotifierKind::Poll,
        poll_interval: Duration::from_millis(20),
        debounce: Duration::from_millis(50),
        grace_period: Duration::from_millis(200),
        ..WatchSettings::default()
    }
}

/// Write a minimal sketch named `name` into `dir` and return its path.
pub fn sketch_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, "def setup\n  size 200, 200\nend\n\ndef draw\nend\n")
        .expect("failed to write test sketch");
    path
}

/// Set the modification time of `path` to `at`.
pub fn touch_at(path: &Path, at: SystemTime) {
    let file = fs::OpenOptions::new()
        .write(true)
        .open(path)
        .expect("failed to open file for touch");
    file.set_modified(at).expect("failed to set mtime");
}

/// A fingerprint `secs` seconds newer than `base`.
pub fn fingerprint_after(base: &Fingerprint, secs: u64) -> Fingerprint {
    Fingerprint::new(base.modified + Duration::from_secs(secs))
}
