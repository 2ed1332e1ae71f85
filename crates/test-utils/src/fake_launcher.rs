use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use rp5::errors::{Result, Rp5Error};
use rp5::launch::{ChildHandle, ChildStatus, LaunchFuture, LaunchSpec, ProcessLauncher};

/// Everything the supervisor asked of the launcher, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LauncherCall {
    Launch(u64),
    Terminate { id: u64, graceful: bool },
}

#[derive(Debug, Default)]
struct FakeState {
    next_id: u64,
    /// Children not yet reaped. `None` means still running.
    children: HashMap<u64, Option<ChildStatus>>,
    max_alive: usize,
    calls: Vec<LauncherCall>,
    specs: Vec<LaunchSpec>,
    ignore_graceful: bool,
    fail_launches: bool,
}

/// A launcher that never spawns anything.
///
/// - records launches and termination requests
/// - tracks how many children are alive at once
/// - lets the test crash a child or make it ignore SIGTERM
pub struct FakeLauncher {
    control: FakeControl,
}

impl FakeLauncher {
    pub fn new() -> (Self, FakeControl) {
        let control = FakeControl::default();
        (
            Self {
                control: control.clone(),
            },
            control,
        )
    }
}

/// Test-side handle onto a [`FakeLauncher`].
#[derive(Clone, Default)]
pub struct FakeControl {
    state: Arc<Mutex<FakeState>>,
    changed: Arc<Notify>,
}

impl FakeControl {
    fn update<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let out = {
            let mut guard = self.state.lock().unwrap();
            f(&mut guard)
        };
        self.changed.notify_waiters();
        out
    }

    /// Like `update`, without waking waiters.
    fn update_quiet<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut guard = self.state.lock().unwrap();
        f(&mut guard)
    }

    fn read<R>(&self, f: impl FnOnce(&FakeState) -> R) -> R {
        let guard = self.state.lock().unwrap();
        f(&guard)
    }

    /// Wait until `cond` holds on the recorded state.
    async fn wait_until(&self, cond: impl Fn(&FakeState) -> bool) {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.read(&cond) {
                return;
            }
            notified.await;
        }
    }

    /// Make the running child `id` exit on its own with `code`.
    pub fn crash(&self, id: u64, code: i32) {
        let status = if code == 0 {
            ChildStatus::ExitedOk
        } else {
            ChildStatus::ExitedError(code)
        };
        self.update(|s| {
            if let Some(slot) = s.children.get_mut(&id) {
                if slot.is_none() {
                    *slot = Some(status);
                }
            }
        });
    }

    /// Children ignore graceful termination; only a forced kill works.
    pub fn ignore_graceful(&self, ignore: bool) {
        self.update(|s| s.ignore_graceful = ignore);
    }

    /// Every launch fails as if the runtime binary were missing.
    pub fn fail_launches(&self, fail: bool) {
        self.update(|s| s.fail_launches = fail);
    }

    pub fn calls(&self) -> Vec<LauncherCall> {
        self.read(|s| s.calls.clone())
    }

    pub fn specs(&self) -> Vec<LaunchSpec> {
        self.read(|s| s.specs.clone())
    }

    pub fn launches(&self) -> usize {
        self.read(|s| {
            s.calls
                .iter()
                .filter(|c| matches!(c, LauncherCall::Launch(_)))
                .count()
        })
    }

    pub fn alive(&self) -> usize {
        self.read(|s| s.children.values().filter(|st| st.is_none()).count())
    }

    /// Highest number of unreaped children ever observed.
    pub fn max_alive(&self) -> usize {
        self.read(|s| s.max_alive)
    }

    /// Id of the most recent launch.
    pub fn last_id(&self) -> Option<u64> {
        self.read(|s| {
            s.calls.iter().rev().find_map(|c| match c {
                LauncherCall::Launch(id) => Some(*id),
                _ => None,
            })
        })
    }

    pub async fn wait_for_launches(&self, n: usize) {
        self.wait_until(|s| {
            s.calls
                .iter()
                .filter(|c| matches!(c, LauncherCall::Launch(_)))
                .count()
                >= n
        })
        .await
    }

    pub async fn wait_for_terminations(&self, n: usize) {
        self.wait_until(|s| {
            s.calls
                .iter()
                .filter(|c| matches!(c, LauncherCall::Terminate { .. }))
                .count()
                >= n
        })
        .await
    }
}

impl ProcessLauncher for FakeLauncher {
    fn launch(&mut self, spec: LaunchSpec) -> LaunchFuture<'_, ChildHandle> {
        let control = self.control.clone();
        Box::pin(async move {
            control.update(|s| {
                if s.fail_launches {
                    return Err(Rp5Error::RuntimeUnavailable {
                        program: spec.program.clone(),
                    });
                }
                s.next_id += 1;
                let id = s.next_id;
                s.children.insert(id, None);
                s.max_alive = s.max_alive.max(s.children.len());
                s.calls.push(LauncherCall::Launch(id));
                s.specs.push(spec);
                Ok(ChildHandle {
                    id,
                    pid: Some(10_000 + id as u32),
                })
            })
        })
    }

    fn terminate(&mut self, handle: ChildHandle, graceful: bool) -> LaunchFuture<'_, ()> {
        let control = self.control.clone();
        Box::pin(async move {
            control.update(|s| {
                s.calls.push(LauncherCall::Terminate {
                    id: handle.id,
                    graceful,
                });
                let ignore = graceful && s.ignore_graceful;
                if let Some(slot) = s.children.get_mut(&handle.id) {
                    if slot.is_none() && !ignore {
                        *slot = Some(ChildStatus::Killed);
                    }
                }
            });
            Ok(())
        })
    }

    fn wait(&mut self, handle: ChildHandle) -> LaunchFuture<'_, ChildStatus> {
        let control = self.control.clone();
        Box::pin(async move {
            loop {
                let notified = control.changed.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                let reaped: Result<Option<ChildStatus>> = control.update_quiet(|s| {
                    match s.children.get(&handle.id) {
                        None => Err(anyhow::anyhow!("wait on unknown child {handle}").into()),
                        Some(None) => Ok(None),
                        Some(Some(status)) => {
                            let status = *status;
                            s.children.remove(&handle.id);
                            Ok(Some(status))
                        }
                    }
                });

                if let Some(status) = reaped? {
                    return Ok(status);
                }
                notified.await;
            }
        })
    }
}
