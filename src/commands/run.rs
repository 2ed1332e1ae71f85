// src/commands/run.rs

//! Foreground launch: spawn the sketch, wait for it, report its status.

use std::future::Future;
use std::time::Duration;

use tracing::info;

use crate::config::Rp5Config;
use crate::errors::{Result, Rp5Error};
use crate::launch::{build_launch_spec, stop_child, ChildStatus, EntryScript, LaunchSpec, ProcessLauncher};
use crate::types::{RuntimeSelector, WatchTarget};

/// Run `target` once with the `run.rb` entry script.
pub async fn run_sketch<L, F>(
    config: &Rp5Config,
    runtime: RuntimeSelector,
    target: &WatchTarget,
    launcher: &mut L,
    interrupt: F,
) -> Result<ChildStatus>
where
    L: ProcessLauncher,
    F: Future<Output = ()>,
{
    ensure_sketch_exists(target)?;
    let spec = build_launch_spec(config, runtime, EntryScript::Run, target)?;
    run_foreground(launcher, spec, config.watch.grace_period, interrupt).await
}

/// Launch `spec` and wait for it to exit.
///
/// If `interrupt` resolves first (e.g. Ctrl-C), the child is stopped
/// gracefully, escalating to a forced kill after `grace`, and reaped.
pub async fn run_foreground<L, F>(
    launcher: &mut L,
    spec: LaunchSpec,
    grace: Duration,
    interrupt: F,
) -> Result<ChildStatus>
where
    L: ProcessLauncher,
    F: Future<Output = ()>,
{
    info!(cmd = %spec.display_line(), "launching");
    let handle = launcher.launch(spec).await?;

    tokio::pin!(interrupt);
    let waited = tokio::select! {
        status = launcher.wait(handle) => Some(status?),
        _ = &mut interrupt => None,
    };

    let status = match waited {
        Some(status) => status,
        None => {
            info!(child = %handle, "interrupted; stopping child");
            stop_child(launcher, handle, grace).await?
        }
    };

    info!(child = %handle, %status, "child finished");
    Ok(status)
}

pub(crate) fn ensure_sketch_exists(target: &WatchTarget) -> Result<()> {
    if target.sketch_path.is_file() {
        Ok(())
    } else {
        Err(Rp5Error::SketchNotFound(target.sketch_path.clone()))
    }
}
