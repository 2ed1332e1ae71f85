// src/commands/live.rs

use std::future::Future;

use crate::commands::run::{ensure_sketch_exists, run_foreground};
use crate::config::Rp5Config;
use crate::errors::Result;
use crate::launch::{build_launch_spec, ChildStatus, EntryScript, ProcessLauncher};
use crate::types::{RuntimeSelector, WatchTarget};

/// Open an interactive session on `target` through the `live.rb` entry
/// script. The console itself is an opaque external process.
pub async fn live_sketch<L, F>(
    config: &Rp5Config,
    runtime: RuntimeSelector,
    target: &WatchTarget,
    emacs: bool,
    launcher: &mut L,
    interrupt: F,
) -> Result<ChildStatus>
where
    L: ProcessLauncher,
    F: Future<Output = ()>,
{
    ensure_sketch_exists(target)?;
    let spec = build_launch_spec(config, runtime, EntryScript::Live { emacs }, target)?;
    run_foreground(launcher, spec, config.watch.grace_period, interrupt).await
}
