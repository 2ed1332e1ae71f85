// src/supervisor/mod.rs

//! Watch supervisor: keeps one sketch process running and restarts it when
//! its sources change.
//!
//! The pure state machine lives in [`core`]; the async/IO shell that talks to
//! the launcher and the event channel is [`runtime`]; [`session`] is the
//! public start/stop API.
//!
//! All inputs (change notifications, stop requests) flow through a single
//! `mpsc` channel into one control task, so state is never mutated
//! concurrently and at most one child is ever alive.

use std::fmt;
use std::time::SystemTime;

use crate::launch::{ChildHandle, ChildStatus};
use crate::types::WatchTarget;
use crate::watch::Fingerprint;

pub mod core;
pub mod runtime;
pub mod session;

pub use self::core::{CoreCommand, CoreInput, CoreStep, SupervisorCore};
pub use runtime::Supervisor;
pub use session::{start, RunningSession, StopHandle, WatchSession};

/// Events flowing into the supervisor from notifiers and signal handlers.
#[derive(Debug, Clone)]
pub enum SupervisorEvent {
    /// A change source observed a new fingerprint of the tracked files.
    SourceChanged { fingerprint: Fingerprint },
    /// Operator asked the session to end (e.g. Ctrl-C).
    StopRequested,
}

/// Lifecycle states of a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Launching,
    Running,
    Restarting,
    Stopped,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SupervisorState::Idle => "idle",
            SupervisorState::Launching => "launching",
            SupervisorState::Running => "running",
            SupervisorState::Restarting => "restarting",
            SupervisorState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// The child currently owned by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildProcess {
    pub handle: ChildHandle,
    pub started_at: SystemTime,
    pub status: ChildStatus,
}

/// Mutable state of a session, owned by the control loop.
#[derive(Debug, Clone)]
pub struct WatchState {
    /// Fingerprint recorded at the last successful launch.
    pub last_modified: Fingerprint,
    pub target: WatchTarget,
    pub child: Option<ChildProcess>,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// `stop()` or an operator interrupt.
    StoppedByUser,
    /// The child exited on its own with no source change pending.
    ChildExited(ChildStatus),
}

/// Summary returned when a session finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub end: SessionEnd,
    pub launches: u32,
    pub restarts: u32,
}

impl SessionReport {
    /// Exit code for the `rp5` process.
    pub fn exit_code(&self) -> i32 {
        match self.end {
            SessionEnd::StoppedByUser => 0,
            SessionEnd::ChildExited(status) => status.exit_code(),
        }
    }
}
