// src/watch/debounce.rs

//! Trailing-edge debouncing of change notifications.
//!
//! Every recorded event pushes the deadline out to `last event + window`;
//! the burst is considered settled once that deadline passes.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_event: Option<Instant>,
    collapsed: u32,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_event: None,
            collapsed: 0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a change observed at `at`.
    pub fn record(&mut self, at: Instant) {
        self.last_event = Some(match self.last_event {
            Some(prev) if prev > at => prev,
            _ => at,
        });
        self.collapsed += 1;
    }

    pub fn is_pending(&self) -> bool {
        self.last_event.is_some()
    }

    /// When the pending burst settles, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.last_event.map(|at| at + self.window)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Clear the pending burst, returning how many events it collapsed.
    pub fn take(&mut self) -> u32 {
        self.last_event = None;
        std::mem::take(&mut self.collapsed)
    }
}
