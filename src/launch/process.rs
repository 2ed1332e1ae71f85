// src/launch/process.rs

//! Real OS-process launcher built on `tokio::process`.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::errors::{Result, Rp5Error};
use crate::launch::backend::{ChildHandle, ChildStatus, LaunchFuture, ProcessLauncher};
use crate::launch::LaunchSpec;

/// Launcher used in production.
///
/// Children inherit the terminal so the sketch can print and read input.
/// Every child is spawned with `kill_on_drop(true)`, so dropping the
/// launcher never leaves an orphan behind.
#[derive(Debug, Default)]
pub struct RealLauncher {
    children: HashMap<u64, Child>,
    next_id: u64,
}

impl RealLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of children spawned but not yet reaped.
    pub fn tracked(&self) -> usize {
        self.children.len()
    }
}

impl ProcessLauncher for RealLauncher {
    fn launch(&mut self, spec: LaunchSpec) -> LaunchFuture<'_, ChildHandle> {
        Box::pin(async move {
            debug!(cmd = %spec.display_line(), "spawning child process");

            let mut cmd = Command::new(&spec.program);
            cmd.args(&spec.args)
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .kill_on_drop(true);

            let child = cmd.spawn().map_err(|source| match source.kind() {
                ErrorKind::NotFound => Rp5Error::RuntimeUnavailable {
                    program: spec.program.clone(),
                },
                _ => Rp5Error::LaunchFailed {
                    program: spec.program.clone(),
                    source,
                },
            })?;

            self.next_id += 1;
            let handle = ChildHandle {
                id: self.next_id,
                pid: child.id(),
            };
            self.children.insert(handle.id, child);

            info!(child = %handle, program = %spec.program, "child process started");
            Ok(handle)
        })
    }

    fn terminate(&mut self, handle: ChildHandle, graceful: bool) -> LaunchFuture<'_, ()> {
        Box::pin(async move {
            let Some(child) = self.children.get_mut(&handle.id) else {
                debug!(child = %handle, "terminate for untracked child; already reaped");
                return Ok(());
            };

            if graceful {
                debug!(child = %handle, "requesting graceful termination");
                request_graceful_exit(child)
            } else {
                debug!(child = %handle, "forcing child to exit");
                child
                    .start_kill()
                    .with_context(|| format!("killing child {handle}"))?;
                Ok(())
            }
        })
    }

    fn wait(&mut self, handle: ChildHandle) -> LaunchFuture<'_, ChildStatus> {
        Box::pin(async move {
            let child = self
                .children
                .get_mut(&handle.id)
                .ok_or_else(|| anyhow!("wait on unknown child {handle}"))?;

            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for child {handle}"))?;
            self.children.remove(&handle.id);

            let status = ChildStatus::from(status);
            debug!(child = %handle, %status, "child reaped");
            Ok(status)
        })
    }
}

#[cfg(unix)]
fn request_graceful_exit(child: &mut Child) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    // `id()` is None once the child has been reaped.
    let Some(pid) = child.id() else {
        return Ok(());
    };
    match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) => Ok(()),
        Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(e) => Err(anyhow!("sending SIGTERM to pid {pid}: {e}").into()),
    }
}

#[cfg(not(unix))]
fn request_graceful_exit(child: &mut Child) -> Result<()> {
    // No cooperative signal to send; the forced kill is the only option.
    child.start_kill().context("killing child")?;
    Ok(())
}

/// Stop `handle` gracefully, escalating to a forced kill once `grace`
/// elapses. Returns the reaped status.
pub async fn stop_child<L: ProcessLauncher + ?Sized>(
    launcher: &mut L,
    handle: ChildHandle,
    grace: Duration,
) -> Result<ChildStatus> {
    if let Err(e) = launcher.terminate(handle, true).await {
        warn!(child = %handle, error = %e, "graceful termination request failed");
    }

    let waited = tokio::time::timeout(grace, launcher.wait(handle)).await;
    match waited {
        Ok(status) => status,
        Err(_) => {
            let timeout = Rp5Error::TerminationTimeout { child: handle, grace };
            warn!(error = %timeout, "escalating to forced kill");
            launcher.terminate(handle, false).await?;
            launcher.wait(handle).await
        }
    }
}
