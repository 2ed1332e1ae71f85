// src/supervisor/session.rs

//! Public API for watch sessions.

use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::WatchSettings;
use crate::errors::{Result, Rp5Error};
use crate::launch::{LaunchSpec, ProcessLauncher};
use crate::types::WatchTarget;
use crate::watch::{probe, spawn_change_source, ChangeSource, Debouncer, Fingerprint, TrackedFiles};

use super::core::SupervisorCore;
use super::runtime::Supervisor;
use super::{SessionReport, SupervisorEvent, SupervisorState};

/// Capacity of the supervisor's event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Start a watch session for `target`.
///
/// Fails with `SketchNotFound` (without launching anything) if the sketch
/// does not exist, and with the launcher's error if the first child cannot
/// be started. On success the first child is running.
pub async fn start<L: ProcessLauncher>(
    target: WatchTarget,
    spec: LaunchSpec,
    settings: &WatchSettings,
    launcher: L,
) -> Result<WatchSession<L>> {
    if !target.sketch_path.is_file() {
        return Err(Rp5Error::SketchNotFound(target.sketch_path.clone()));
    }

    let tracked = Arc::new(TrackedFiles::new(&target.sketch_path, settings)?);
    let initial = probe(&tracked, settings.use_hash)?;
    debug!(?initial, files = ?tracked.collect()?, "initial sketch fingerprint");

    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let core = SupervisorCore::new(target, initial.clone(), Debouncer::new(settings.debounce));
    let mut supervisor = Supervisor::new(core, spec, launcher, events_rx, settings.grace_period);

    supervisor.begin().await?;

    Ok(WatchSession {
        supervisor,
        events_tx,
        tracked,
        initial,
        settings: settings.clone(),
        source: None,
    })
}

/// A started session whose control loop has not been driven yet.
#[derive(Debug)]
pub struct WatchSession<L: ProcessLauncher> {
    supervisor: Supervisor<L>,
    events_tx: mpsc::Sender<SupervisorEvent>,
    tracked: Arc<TrackedFiles>,
    initial: Fingerprint,
    settings: WatchSettings,
    source: Option<ChangeSource>,
}

impl<L: ProcessLauncher> WatchSession<L> {
    pub fn state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    /// Sender for injecting events directly (notifiers, tests).
    pub fn events(&self) -> mpsc::Sender<SupervisorEvent> {
        self.events_tx.clone()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            events_tx: self.events_tx.clone(),
        }
    }

    pub fn tracked(&self) -> &TrackedFiles {
        &self.tracked
    }

    /// Start the configured change source (poller or file events).
    pub fn spawn_change_source(&mut self) -> Result<()> {
        let source = spawn_change_source(
            &self.settings,
            Arc::clone(&self.tracked),
            self.initial.clone(),
            self.events_tx.clone(),
        )?;
        self.source = Some(source);
        Ok(())
    }

    /// Drive the session to completion on the current task.
    pub async fn run(self) -> Result<SessionReport> {
        let WatchSession {
            supervisor,
            events_tx: _events_tx,
            source: _source,
            ..
        } = self;
        supervisor.run().await
    }

    /// Drive the session on a background task.
    pub fn spawn(self) -> RunningSession
    where
        L: 'static,
    {
        let events_tx = self.events_tx.clone();
        let join = tokio::spawn(self.run());
        RunningSession { events_tx, join }
    }
}

/// Cloneable handle that asks a session to stop.
#[derive(Debug, Clone)]
pub struct StopHandle {
    events_tx: mpsc::Sender<SupervisorEvent>,
}

impl StopHandle {
    /// Request a stop. Returns `false` if the session already ended.
    pub async fn request(&self) -> bool {
        self.events_tx
            .send(SupervisorEvent::StopRequested)
            .await
            .is_ok()
    }
}

/// A session running on a background task.
#[derive(Debug)]
pub struct RunningSession {
    events_tx: mpsc::Sender<SupervisorEvent>,
    join: JoinHandle<Result<SessionReport>>,
}

impl RunningSession {
    pub fn events(&self) -> &mpsc::Sender<SupervisorEvent> {
        &self.events_tx
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Stop the session gracefully.
    ///
    /// Returns only after the child has been terminated and reaped.
    pub async fn stop(self) -> Result<SessionReport> {
        info!("stopping watch session");
        if self
            .events_tx
            .send(SupervisorEvent::StopRequested)
            .await
            .is_err()
        {
            debug!("session already finished before stop");
        }
        self.wait().await
    }

    /// Wait for the session to end on its own.
    pub async fn wait(self) -> Result<SessionReport> {
        let RunningSession { events_tx, join } = self;
        let outcome = join
            .await
            .map_err(|e| Rp5Error::from(anyhow!("watch session task failed: {e}")))?;
        drop(events_tx);
        outcome
    }
}
