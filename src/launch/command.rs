// src/launch/command.rs

//! Command-line construction for sketch processes.
//!
//! The argument vector is always ordered as: runtime options, entry script,
//! sketch path, trailing sketch arguments.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::Rp5Config;
use crate::errors::Result;
use crate::types::{RuntimeSelector, WatchTarget};

/// Main class of `jruby-complete.jar`.
pub const JRUBY_MAIN_CLASS: &str = "org.jruby.Main";

/// Per-sketch JVM options, relative to the sketch directory.
pub const JAVA_ARGS_FILE: &str = "data/java_args.txt";

/// A fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Render as a single shell-ish line for logs and dry runs.
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Which runner script the runtime executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryScript {
    /// `run.rb`: used by both `run` and `watch`.
    Run,
    /// `live.rb`: interactive session. `emacs` disables readline for
    /// inferior-mode consoles.
    Live { emacs: bool },
}

impl EntryScript {
    pub fn file_name(&self) -> &'static str {
        match self {
            EntryScript::Run => "run.rb",
            EntryScript::Live { .. } => "live.rb",
        }
    }

    pub fn path(&self, config: &Rp5Config) -> PathBuf {
        config.runners_dir.join(self.file_name())
    }
}

/// Build the launch spec for `target` on the selected runtime.
pub fn build_launch_spec(
    config: &Rp5Config,
    runtime: RuntimeSelector,
    entry: EntryScript,
    target: &WatchTarget,
) -> Result<LaunchSpec> {
    let mut jvm_opts = config.jvm_opts.clone();
    jvm_opts.extend(read_java_args(&target.sketch_path)?);

    let mut args = Vec::new();
    let program = match runtime {
        RuntimeSelector::SystemJruby => {
            args.extend(jvm_opts.into_iter().map(|opt| format!("-J{opt}")));
            config.jruby_bin.clone()
        }
        RuntimeSelector::JrubyComplete => {
            args.extend(jvm_opts);
            args.push("-cp".to_string());
            args.push(config.jruby_complete.display().to_string());
            args.push(JRUBY_MAIN_CLASS.to_string());
            config.java.clone()
        }
    };

    args.push(entry.path(config).display().to_string());
    if let EntryScript::Live { emacs: true } = entry {
        args.push("--noreadline".to_string());
    }
    args.push(target.sketch_path.display().to_string());
    args.extend(target.extra_args.iter().cloned());

    Ok(LaunchSpec { program, args })
}

/// Read whitespace-separated JVM options from `<sketch dir>/data/java_args.txt`.
///
/// A missing file yields no options.
pub fn read_java_args(sketch_path: &Path) -> Result<Vec<String>> {
    let dir = match sketch_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let path = dir.join(JAVA_ARGS_FILE);
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("reading JVM options from {:?}", path))?;
    Ok(contents.split_whitespace().map(str::to_string).collect())
}
