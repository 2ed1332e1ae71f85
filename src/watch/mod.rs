// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - deciding which files belong to a sketch ([`patterns`]),
//! - fingerprinting them by modification time and optional content hash
//!   ([`fingerprint`]),
//! - the two change sources: a fixed-interval poller ([`poller`]) and a
//!   `notify`-based watcher ([`watcher`]),
//! - debouncing bursts of changes ([`debounce`]).
//!
//! Change sources only *report* fingerprints; whether one warrants a restart
//! is decided by the supervisor.

pub mod debounce;
pub mod fingerprint;
pub mod patterns;
pub mod poller;
pub mod watcher;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::WatchSettings;
use crate::errors::Result;
use crate::supervisor::SupervisorEvent;
use crate::types::NotifierKind;

pub use debounce::Debouncer;
pub use fingerprint::{compute_hash_for_paths, probe, Fingerprint};
pub use patterns::TrackedFiles;
pub use poller::{spawn_poller, PollerHandle};
pub use watcher::{spawn_watcher, WatcherHandle};

/// A running change source. Dropping it stops notifications.
#[derive(Debug)]
pub enum ChangeSource {
    Poll(PollerHandle),
    Events(WatcherHandle),
}

/// Start the change source selected by `settings.notifier`.
pub fn spawn_change_source(
    settings: &WatchSettings,
    tracked: Arc<TrackedFiles>,
    initial: Fingerprint,
    events_tx: mpsc::Sender<SupervisorEvent>,
) -> Result<ChangeSource> {
    match settings.notifier {
        NotifierKind::Poll => Ok(ChangeSource::Poll(spawn_poller(
            tracked,
            settings.use_hash,
            settings.poll_interval,
            initial,
            events_tx,
        ))),
        NotifierKind::Events => Ok(ChangeSource::Events(spawn_watcher(
            tracked,
            settings.use_hash,
            initial,
            events_tx,
        )?)),
    }
}
