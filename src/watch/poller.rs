// src/watch/poller.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::supervisor::SupervisorEvent;
use crate::watch::fingerprint::{probe, Fingerprint};
use crate::watch::patterns::TrackedFiles;

/// Handle for the polling notifier. Dropping it stops polling.
#[derive(Debug)]
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Probe `tracked` every `interval` and send a `SourceChanged` event whenever
/// the fingerprint differs from the previous probe.
///
/// `initial` is the fingerprint recorded at the first launch, so an
/// untouched sketch produces no events.
pub fn spawn_poller(
    tracked: Arc<TrackedFiles>,
    use_hash: bool,
    interval: Duration,
    initial: Fingerprint,
    events_tx: mpsc::Sender<SupervisorEvent>,
) -> PollerHandle {
    info!(
        sketch = %tracked.sketch().display(),
        ?interval,
        "polling for sketch changes"
    );

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        let mut last = initial;
        loop {
            ticker.tick().await;

            let probe_target = Arc::clone(&tracked);
            let probed =
                tokio::task::spawn_blocking(move || probe(&probe_target, use_hash)).await;

            let fingerprint = match probed {
                Ok(Ok(fingerprint)) => fingerprint,
                Ok(Err(e)) => {
                    debug!(error = %e, "probe failed; retrying next tick");
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "probe task panicked");
                    continue;
                }
            };

            if fingerprint == last {
                continue;
            }
            last = fingerprint.clone();

            debug!(?fingerprint, "tracked sources changed");
            if events_tx
                .send(SupervisorEvent::SourceChanged { fingerprint })
                .await
                .is_err()
            {
                debug!("supervisor gone; poller exiting");
                break;
            }
        }
    });

    PollerHandle { task }
}
