// src/watch/watcher.rs

use std::sync::Arc;

use anyhow::Context;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::errors::Result;
use crate::supervisor::SupervisorEvent;
use crate::watch::fingerprint::{probe, Fingerprint};
use crate::watch::patterns::TrackedFiles;

/// Handle for the event-based notifier.
///
/// Keeps the underlying `RecommendedWatcher` alive; dropping the handle stops
/// file watching and the forwarding task.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Watch the sketch directory with OS file events.
///
/// The directory (not the file) is watched so editors that save by renaming
/// a temp file over the sketch keep being observed. Each relevant event
/// triggers a fresh probe; a `SourceChanged` event is sent when the
/// fingerprint differs from the previous one.
pub fn spawn_watcher(
    tracked: Arc<TrackedFiles>,
    use_hash: bool,
    initial: Fingerprint,
    events_tx: mpsc::Sender<SupervisorEvent>,
) -> Result<WatcherHandle> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    // Called synchronously by notify on its own thread.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("rp5: failed to forward file event: {err}");
                }
            }
            Err(err) => {
                eprintln!("rp5: file watch error: {err}");
            }
        },
        Config::default(),
    )
    .context("creating file watcher")?;

    let mode = if tracked.watches_dir() {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    watcher
        .watch(tracked.root(), mode)
        .with_context(|| format!("watching {:?}", tracked.root()))?;

    info!(root = ?tracked.root(), ?mode, "file watcher started");

    let task = tokio::spawn(async move {
        let mut last = initial;

        while let Some(event) = event_rx.recv().await {
            if matches!(event.kind, EventKind::Access(_)) {
                continue;
            }
            if !event.paths.iter().any(|p| tracked.is_tracked(p)) {
                continue;
            }
            debug!(?event, "tracked file event");

            let probe_target = Arc::clone(&tracked);
            let fingerprint =
                match tokio::task::spawn_blocking(move || probe(&probe_target, use_hash)).await {
                    Ok(Ok(fingerprint)) => fingerprint,
                    Ok(Err(e)) => {
                        debug!(error = %e, "probe after file event failed");
                        continue;
                    }
                    Err(e) => {
                        debug!(error = %e, "probe task panicked");
                        continue;
                    }
                };

            if fingerprint == last {
                continue;
            }
            last = fingerprint.clone();

            if events_tx
                .send(SupervisorEvent::SourceChanged { fingerprint })
                .await
                .is_err()
            {
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        task,
    })
}
