use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

/// Which JRuby flavour launches a sketch.
///
/// - `SystemJruby`: a `jruby` executable found on `PATH` (or configured).
/// - `JrubyComplete`: `java -cp jruby-complete.jar org.jruby.Main`, the
///   default when no system JRuby is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeSelector {
    SystemJruby,
    JrubyComplete,
}

impl RuntimeSelector {
    /// Map the `jruby = true/false` config flag onto a selector.
    pub fn from_jruby_flag(jruby: bool) -> Self {
        if jruby {
            RuntimeSelector::SystemJruby
        } else {
            RuntimeSelector::JrubyComplete
        }
    }
}

/// How watch mode learns about source changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// Probe modification times on a fixed interval (default).
    Poll,
    /// Use OS file events via `notify`, then probe on each event.
    Events,
}

impl Default for NotifierKind {
    fn default() -> Self {
        NotifierKind::Poll
    }
}

impl FromStr for NotifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "poll" => Ok(NotifierKind::Poll),
            "events" => Ok(NotifierKind::Events),
            other => Err(format!(
                "invalid notifier: {other} (expected \"poll\" or \"events\")"
            )),
        }
    }
}

/// The sketch a session launches, with the arguments passed after it.
///
/// Immutable for the life of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub sketch_path: PathBuf,
    pub extra_args: Vec<String>,
}

impl WatchTarget {
    pub fn new(sketch_path: impl Into<PathBuf>, extra_args: Vec<String>) -> Self {
        Self {
            sketch_path: sketch_path.into(),
            extra_args,
        }
    }
}
