// src/config/validate.rs

use std::time::Duration;

use globset::Glob;

use crate::config::model::{
    default_patterns, RawConfigFile, RawWatchSection, Rp5Config, WatchSettings,
    DEFAULT_DEBOUNCE, DEFAULT_GRACE_PERIOD, DEFAULT_POLL_INTERVAL,
};
use crate::errors::{Result, Rp5Error};

impl TryFrom<RawConfigFile> for Rp5Config {
    type Error = Rp5Error;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let defaults = Rp5Config::default();

        let java = non_empty("java", raw.java, defaults.java)?;
        let jruby_bin = non_empty("jruby_bin", raw.jruby_bin, defaults.jruby_bin)?;
        let watch = validate_watch(raw.watch)?;

        Ok(Rp5Config {
            jruby: raw.jruby,
            java,
            jruby_bin,
            jruby_complete: raw.jruby_complete.unwrap_or(defaults.jruby_complete),
            runners_dir: raw.runners_dir.unwrap_or(defaults.runners_dir),
            jvm_opts: raw.jvm_opts,
            installer: raw.installer,
            watch,
        })
    }
}

fn non_empty(key: &str, value: Option<String>, default: String) -> Result<String> {
    match value {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Err(Rp5Error::ConfigError(format!(
            "`{key}` must not be empty"
        ))),
        Some(v) => Ok(v),
    }
}

fn validate_watch(raw: RawWatchSection) -> Result<WatchSettings> {
    let poll_interval =
        duration_field("watch.poll_interval", raw.poll_interval, DEFAULT_POLL_INTERVAL)?;
    if poll_interval.is_zero() {
        return Err(Rp5Error::ConfigError(
            "[watch].poll_interval must be greater than zero".to_string(),
        ));
    }

    let debounce = duration_field("watch.debounce", raw.debounce, DEFAULT_DEBOUNCE)?;
    let grace_period =
        duration_field("watch.grace_period", raw.grace_period, DEFAULT_GRACE_PERIOD)?;

    let patterns = raw.patterns.unwrap_or_else(default_patterns);
    let watch_dir = raw.watch_dir.unwrap_or(true);
    if watch_dir && patterns.is_empty() {
        return Err(Rp5Error::ConfigError(
            "[watch].patterns must not be empty when watch_dir = true".to_string(),
        ));
    }
    for pattern in &patterns {
        Glob::new(pattern).map_err(|e| {
            Rp5Error::ConfigError(format!("invalid watch pattern '{pattern}': {e}"))
        })?;
    }

    Ok(WatchSettings {
        notifier: raw.notifier,
        poll_interval,
        debounce,
        grace_period,
        watch_dir,
        patterns,
        use_hash: raw.use_hash,
    })
}

fn duration_field(key: &str, value: Option<String>, default: Duration) -> Result<Duration> {
    match value {
        None => Ok(default),
        Some(s) => parse_duration(&s)
            .map_err(|e| Rp5Error::ConfigError(format!("`{key}`: {e}"))),
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => scaled_secs(value, 60),
        "h" => scaled_secs(value, 60 * 60),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

fn scaled_secs(value: u64, factor: u64) -> std::result::Result<Duration, String> {
    value
        .checked_mul(factor)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", value))
}
