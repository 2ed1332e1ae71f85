// src/supervisor/core.rs

//! Pure supervisor state machine.
//!
//! [`SupervisorCore`] consumes [`CoreInput`]s and returns a [`CoreStep`]
//! describing what the IO shell should do next. It owns no channels, no
//! processes and never touches the filesystem, so every transition can be
//! driven deterministically from tests.
//!
//! Invariant: a `Launch` command is only ever emitted while no child is
//! tracked, so at most one child is alive per session.

use std::time::SystemTime;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::launch::{ChildHandle, ChildStatus};
use crate::supervisor::{ChildProcess, SessionEnd, SupervisorState, WatchState};
use crate::types::WatchTarget;
use crate::watch::{Debouncer, Fingerprint};

/// Inputs fed into the core by the IO shell.
#[derive(Debug, Clone)]
pub enum CoreInput {
    /// Session start: launch the first child.
    Started,
    /// A change source reported a fingerprint at `at`.
    SourceChanged { fingerprint: Fingerprint, at: Instant },
    /// The debounce deadline may have passed.
    DebounceElapsed { at: Instant },
    /// The launcher returned a live handle.
    Launched { handle: ChildHandle, at: SystemTime },
    /// The launcher could not start the child.
    LaunchFailed,
    /// The child exited without being asked to.
    ChildExited { status: ChildStatus },
    /// A requested termination completed and the child was reaped.
    TerminationConfirmed { status: ChildStatus },
    /// Operator asked the session to end.
    StopRequested,
}

/// Command produced by the core, executed by the IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Launch a new child for the session's target.
    Launch,
    /// Terminate this child (graceful first, bounded, then forced).
    Terminate { handle: ChildHandle },
    /// The session is over.
    Finish(SessionEnd),
}

/// Decision returned by the core after a single input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the control loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn idle() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }

    fn run(command: CoreCommand) -> Self {
        Self {
            commands: vec![command],
            keep_running: true,
        }
    }

    fn finish(end: SessionEnd) -> Self {
        Self {
            commands: vec![CoreCommand::Finish(end)],
            keep_running: false,
        }
    }
}

#[derive(Debug)]
pub struct SupervisorCore {
    state: SupervisorState,
    watch: WatchState,
    debounce: Debouncer,
    /// Newest accepted fingerprint not yet recorded by a launch.
    pending: Option<Fingerprint>,
    stop_requested: bool,
    launches: u32,
    restarts: u32,
}

impl SupervisorCore {
    pub fn new(target: WatchTarget, initial: Fingerprint, debounce: Debouncer) -> Self {
        Self {
            state: SupervisorState::Idle,
            watch: WatchState {
                last_modified: initial,
                target,
                child: None,
            },
            debounce,
            pending: None,
            stop_requested: false,
            launches: 0,
            restarts: 0,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn watch_state(&self) -> &WatchState {
        &self.watch
    }

    /// Handle of the tracked child while it is alive.
    pub fn alive_child(&self) -> Option<ChildHandle> {
        self.watch
            .child
            .as_ref()
            .filter(|c| c.status.is_alive())
            .map(|c| c.handle)
    }

    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    pub fn launches(&self) -> u32 {
        self.launches
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Handle a single input, updating state and returning commands.
    pub fn step(&mut self, input: CoreInput) -> CoreStep {
        match input {
            CoreInput::Started => self.on_started(),
            CoreInput::SourceChanged { fingerprint, at } => {
                self.on_source_changed(fingerprint, at)
            }
            CoreInput::DebounceElapsed { at } => self.on_debounce_elapsed(at),
            CoreInput::Launched { handle, at } => self.on_launched(handle, at),
            CoreInput::LaunchFailed => self.on_launch_failed(),
            CoreInput::ChildExited { status } => self.on_child_exited(status),
            CoreInput::TerminationConfirmed { status } => self.on_termination_confirmed(status),
            CoreInput::StopRequested => self.on_stop_requested(),
        }
    }

    fn on_started(&mut self) -> CoreStep {
        if self.state != SupervisorState::Idle {
            warn!(state = %self.state, "session already started; ignoring");
            return CoreStep::idle();
        }
        self.launch()
    }

    fn on_source_changed(&mut self, fingerprint: Fingerprint, at: Instant) -> CoreStep {
        if self.state == SupervisorState::Stopped || self.stop_requested {
            return CoreStep::idle();
        }

        let baseline = self.pending.as_ref().unwrap_or(&self.watch.last_modified);
        if !fingerprint.is_newer_than(baseline) {
            debug!(?fingerprint, "change not newer than recorded sources; ignoring");
            return CoreStep::idle();
        }

        debug!(state = %self.state, "source change accepted; debouncing");
        self.pending = Some(fingerprint);
        self.debounce.record(at);
        CoreStep::idle()
    }

    fn on_debounce_elapsed(&mut self, at: Instant) -> CoreStep {
        if !self.debounce.is_due(at) {
            return CoreStep::idle();
        }
        // Only a running child can be restarted; in any other state the
        // burst stays pending and is picked up once the child is running.
        if self.state != SupervisorState::Running {
            return CoreStep::idle();
        }
        let Some(handle) = self.alive_child() else {
            return CoreStep::idle();
        };

        let collapsed = self.debounce.take();
        self.restarts += 1;
        self.state = SupervisorState::Restarting;
        info!(child = %handle, collapsed, "sources changed; restarting sketch");
        CoreStep::run(CoreCommand::Terminate { handle })
    }

    fn on_launched(&mut self, handle: ChildHandle, at: SystemTime) -> CoreStep {
        if self.state != SupervisorState::Launching {
            warn!(child = %handle, state = %self.state, "unexpected launch confirmation");
        }
        if let Some(fingerprint) = self.pending.take() {
            // The new child already runs these sources; drop the burst
            // recorded for them.
            self.watch.last_modified = fingerprint;
            let absorbed = self.debounce.take();
            if absorbed > 0 {
                debug!(child = %handle, absorbed, "pending changes absorbed by launch");
            }
        }
        self.watch.child = Some(ChildProcess {
            handle,
            started_at: at,
            status: ChildStatus::Running,
        });
        self.launches += 1;
        self.state = SupervisorState::Running;

        if self.stop_requested {
            // Stop arrived while the launch was in flight.
            return CoreStep::run(CoreCommand::Terminate { handle });
        }
        CoreStep::idle()
    }

    fn on_launch_failed(&mut self) -> CoreStep {
        self.state = SupervisorState::Stopped;
        self.watch.child = None;
        CoreStep {
            commands: Vec::new(),
            keep_running: false,
        }
    }

    fn on_child_exited(&mut self, status: ChildStatus) -> CoreStep {
        self.record_exit(status);

        if self.stop_requested {
            self.state = SupervisorState::Stopped;
            return CoreStep::finish(SessionEnd::StoppedByUser);
        }

        if self.debounce.is_pending() {
            // A change was already on its way; treat the exit as the restart.
            let collapsed = self.debounce.take();
            self.restarts += 1;
            info!(%status, collapsed, "sketch exited with a change pending; relaunching");
            return self.launch();
        }

        warn!(%status, "sketch exited with no pending change; ending session");
        self.state = SupervisorState::Stopped;
        CoreStep::finish(SessionEnd::ChildExited(status))
    }

    fn on_termination_confirmed(&mut self, status: ChildStatus) -> CoreStep {
        self.record_exit(status);

        if self.stop_requested {
            self.state = SupervisorState::Stopped;
            return CoreStep::finish(SessionEnd::StoppedByUser);
        }
        self.launch()
    }

    fn on_stop_requested(&mut self) -> CoreStep {
        if self.stop_requested || self.state == SupervisorState::Stopped {
            return CoreStep::idle();
        }
        self.stop_requested = true;
        self.debounce.take();

        match (self.state, self.alive_child()) {
            (SupervisorState::Running, Some(handle)) => {
                info!(child = %handle, "stop requested; terminating sketch");
                CoreStep::run(CoreCommand::Terminate { handle })
            }
            // Termination or launch already in flight; its confirmation
            // finishes the session.
            (SupervisorState::Restarting, _) | (SupervisorState::Launching, _) => {
                CoreStep::idle()
            }
            _ => {
                self.state = SupervisorState::Stopped;
                CoreStep::finish(SessionEnd::StoppedByUser)
            }
        }
    }

    fn launch(&mut self) -> CoreStep {
        debug_assert!(
            self.alive_child().is_none(),
            "launch requested while a child is alive"
        );
        self.state = SupervisorState::Launching;
        CoreStep::run(CoreCommand::Launch)
    }

    fn record_exit(&mut self, status: ChildStatus) {
        if let Some(child) = self.watch.child.take() {
            debug!(child = %child.handle, %status, "child no longer alive");
        }
    }
}
