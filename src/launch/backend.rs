// src/launch/backend.rs

//! Pluggable process launcher abstraction.
//!
//! The supervisor talks to a `ProcessLauncher` instead of spawning processes
//! itself. Production code uses [`RealLauncher`](super::RealLauncher); tests
//! provide a fake that records calls and simulates exits.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::process::ExitStatus;

use crate::errors::Result;
use crate::launch::LaunchSpec;

/// Boxed future returned by launcher operations.
pub type LaunchFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Opaque handle to a launched child.
///
/// `id` is unique per launcher; `pid` is the OS process id when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildHandle {
    pub id: u64,
    pub pid: Option<u32>,
}

impl fmt::Display for ChildHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pid {
            Some(pid) => write!(f, "#{} (pid {})", self.id, pid),
            None => write!(f, "#{}", self.id),
        }
    }
}

/// Lifecycle status of a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildStatus {
    Running,
    ExitedOk,
    ExitedError(i32),
    /// Terminated by a signal (including our own termination requests).
    Killed,
}

impl ChildStatus {
    /// Exit code this status maps to for the `rp5` process itself.
    pub fn exit_code(&self) -> i32 {
        match self {
            ChildStatus::Running | ChildStatus::ExitedOk => 0,
            ChildStatus::ExitedError(code) => *code,
            ChildStatus::Killed => 1,
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self, ChildStatus::Running)
    }
}

impl From<ExitStatus> for ChildStatus {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            ChildStatus::ExitedOk
        } else {
            match status.code() {
                Some(code) => ChildStatus::ExitedError(code),
                None => ChildStatus::Killed,
            }
        }
    }
}

impl fmt::Display for ChildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildStatus::Running => write!(f, "running"),
            ChildStatus::ExitedOk => write!(f, "exited successfully"),
            ChildStatus::ExitedError(code) => write!(f, "exited with code {code}"),
            ChildStatus::Killed => write!(f, "killed by signal"),
        }
    }
}

/// Starts, stops and reaps child processes.
pub trait ProcessLauncher: Send {
    /// Start a process for `spec` and return a live handle.
    ///
    /// A missing executable must surface as `Rp5Error::RuntimeUnavailable`.
    fn launch(&mut self, spec: LaunchSpec) -> LaunchFuture<'_, ChildHandle>;

    /// Ask the child to stop: a cooperative signal when `graceful`, a forced
    /// kill otherwise. Returns without waiting for the exit.
    fn terminate(&mut self, handle: ChildHandle, graceful: bool) -> LaunchFuture<'_, ()>;

    /// Wait for the child to exit and reap it.
    ///
    /// Must be cancel-safe: dropping the future before it completes leaves
    /// the child tracked so `wait` can be called again.
    fn wait(&mut self, handle: ChildHandle) -> LaunchFuture<'_, ChildStatus>;
}
