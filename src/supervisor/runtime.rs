// src/supervisor/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, SystemTime};

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::errors::{Result, Rp5Error};
use crate::launch::{ChildHandle, ChildStatus, LaunchSpec, ProcessLauncher};

use super::core::{CoreCommand, CoreInput, CoreStep, SupervisorCore};
use super::{SessionReport, SupervisorEvent, SupervisorState};

/// Drives a [`SupervisorCore`] from the event channel and executes its
/// commands against a [`ProcessLauncher`].
///
/// This is the single control task of a session: all state transitions
/// happen here, one input at a time.
pub struct Supervisor<L: ProcessLauncher> {
    core: SupervisorCore,
    spec: LaunchSpec,
    launcher: L,
    event_rx: mpsc::Receiver<SupervisorEvent>,
    grace_period: Duration,
}

impl<L: ProcessLauncher> fmt::Debug for Supervisor<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("core", &self.core)
            .field("spec", &self.spec)
            .field("grace_period", &self.grace_period)
            .finish_non_exhaustive()
    }
}

/// What the control loop should do after executing a batch of commands.
enum Flow {
    Continue,
    Done(SessionReport),
}

impl<L: ProcessLauncher> Supervisor<L> {
    pub fn new(
        core: SupervisorCore,
        spec: LaunchSpec,
        launcher: L,
        event_rx: mpsc::Receiver<SupervisorEvent>,
        grace_period: Duration,
    ) -> Self {
        Self {
            core,
            spec,
            launcher,
            event_rx,
            grace_period,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.core.state()
    }

    pub fn core(&self) -> &SupervisorCore {
        &self.core
    }

    /// Launch the first child. Fails if the launcher cannot start it.
    pub async fn begin(&mut self) -> Result<()> {
        let step = self.core.step(CoreInput::Started);
        match self.execute(step).await? {
            Flow::Continue => Ok(()),
            // `Started` only ever yields a launch.
            Flow::Done(_) => Err(anyhow!("session finished before its first launch").into()),
        }
    }

    /// Main control loop. Returns once the session reaches `Stopped`.
    pub async fn run(mut self) -> Result<SessionReport> {
        info!(
            sketch = %self.core.watch_state().target.sketch_path.display(),
            "watch session running"
        );

        loop {
            let Some(handle) = self.core.alive_child() else {
                return Err(anyhow!(
                    "supervisor in state {} without a live child",
                    self.core.state()
                )
                .into());
            };
            let deadline = self.core.debounce_deadline();

            let input = tokio::select! {
                status = self.launcher.wait(handle) => {
                    let status = status?;
                    info!(child = %handle, %status, "sketch process exited");
                    CoreInput::ChildExited { status }
                }
                event = self.event_rx.recv() => match event {
                    Some(SupervisorEvent::SourceChanged { fingerprint }) => {
                        CoreInput::SourceChanged { fingerprint, at: Instant::now() }
                    }
                    Some(SupervisorEvent::StopRequested) => CoreInput::StopRequested,
                    None => {
                        debug!("event channel closed; stopping session");
                        CoreInput::StopRequested
                    }
                },
                _ = sleep_until(deadline) => CoreInput::DebounceElapsed { at: Instant::now() },
            };

            let step = self.core.step(input);
            if let Flow::Done(report) = self.execute(step).await? {
                info!(end = ?report.end, launches = report.launches, restarts = report.restarts, "watch session finished");
                return Ok(report);
            }
        }
    }

    async fn execute(&mut self, step: CoreStep) -> Result<Flow> {
        let mut queue: VecDeque<CoreCommand> = step.commands.into();

        while let Some(command) = queue.pop_front() {
            let next = match command {
                CoreCommand::Launch => self.launch_child().await?,
                CoreCommand::Terminate { handle } => self.terminate_child(handle).await?,
                CoreCommand::Finish(end) => {
                    return Ok(Flow::Done(SessionReport {
                        end,
                        launches: self.core.launches(),
                        restarts: self.core.restarts(),
                    }));
                }
            };
            queue.extend(next.commands);
        }

        Ok(Flow::Continue)
    }

    async fn launch_child(&mut self) -> Result<CoreStep> {
        debug!(cmd = %self.spec.display_line(), "launching sketch");

        match self.launcher.launch(self.spec.clone()).await {
            Ok(handle) => {
                info!(child = %handle, "sketch launched");
                Ok(self.core.step(CoreInput::Launched {
                    handle,
                    at: SystemTime::now(),
                }))
            }
            Err(err) => {
                error!(error = %err, "failed to launch sketch; stopping session");
                self.core.step(CoreInput::LaunchFailed);
                Err(err)
            }
        }
    }

    /// Terminate `handle`: graceful request, bounded wait, forced kill.
    ///
    /// Keeps reading the event channel while waiting. Change notifications
    /// are recorded; a stop request escalates to a forced kill at once. In
    /// every case the child is reaped before this returns.
    async fn terminate_child(&mut self, handle: ChildHandle) -> Result<CoreStep> {
        if let Err(e) = self.launcher.terminate(handle, true).await {
            warn!(child = %handle, error = %e, "graceful termination request failed");
        }

        let grace = tokio::time::sleep(self.grace_period);
        tokio::pin!(grace);
        let mut listening = true;

        let status = loop {
            tokio::select! {
                status = self.launcher.wait(handle) => break status?,
                _ = &mut grace => {
                    let timeout = Rp5Error::TerminationTimeout {
                        child: handle,
                        grace: self.grace_period,
                    };
                    warn!(error = %timeout, "escalating to forced kill");
                    break self.force_kill(handle).await?;
                }
                event = self.event_rx.recv(), if listening => match event {
                    Some(SupervisorEvent::SourceChanged { fingerprint }) => {
                        self.core.step(CoreInput::SourceChanged { fingerprint, at: Instant::now() });
                    }
                    Some(SupervisorEvent::StopRequested) => {
                        info!(child = %handle, "stop requested during termination; forcing");
                        self.core.step(CoreInput::StopRequested);
                        break self.force_kill(handle).await?;
                    }
                    None => {
                        listening = false;
                        self.core.step(CoreInput::StopRequested);
                    }
                },
            }
        };

        debug!(child = %handle, %status, "termination confirmed");
        Ok(self.core.step(CoreInput::TerminationConfirmed { status }))
    }

    async fn force_kill(&mut self, handle: ChildHandle) -> Result<ChildStatus> {
        if let Err(e) = self.launcher.terminate(handle, false).await {
            warn!(child = %handle, error = %e, "forced kill request failed");
        }
        self.launcher.wait(handle).await
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
