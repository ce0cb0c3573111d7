//! Busy-indicator gate with a visibility delay.

use std::time::{Duration, Instant};

/// Reference-counted busy indicator shared by both schedulers.
///
/// Visibility is raised only once a job has been running longer than the
/// configured delay -- fast no-op renders never flash the indicator -- and
/// drops the moment the last active job ends.
#[derive(Debug)]
pub struct SpinnerGate {
    delay: Duration,
    active: u32,
    since: Option<Instant>,
}

impl SpinnerGate {
    /// Create a gate with the given visibility delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            active: 0,
            since: None,
        }
    }

    /// A job started.
    pub fn begin(&mut self, now: Instant) {
        self.active += 1;
        if self.active == 1 {
            self.since = Some(now);
        }
    }

    /// A job ended (success or failure alike).
    pub fn end(&mut self) {
        self.active = self.active.saturating_sub(1);
        if self.active == 0 {
            self.since = None;
        }
    }

    /// Number of active jobs.
    pub fn active(&self) -> u32 {
        self.active
    }

    /// Whether the indicator should be shown right now.
    pub fn visible(&self, now: Instant) -> bool {
        self.since
            .is_some_and(|since| now.duration_since(since) >= self.delay)
    }
}
