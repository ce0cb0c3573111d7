//! Render round identity and scheduler run states.

use chrono::{DateTime, Utc};
use std::fmt;

/// Monotonically increasing identifier for one render attempt.
///
/// Each scheduler numbers its own rounds starting at 1; the number is used for
/// ordering and diagnostics, never reused within a scheduler's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Round(u64);

impl Round {
    /// Create a round from a raw counter value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw counter value.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// The round that follows this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context handed to a render producer for one round.
///
/// Carries the document name and start timestamp alongside the round number,
/// and travels through the producer back to the completion handler unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundContext {
    /// Name of the document being rendered.
    pub doc_name: String,
    /// The round this context belongs to.
    pub round: Round,
    /// Wall-clock time the round was started.
    pub started_at: DateTime<Utc>,
}

impl RoundContext {
    /// Create a context stamped with the current wall-clock time.
    pub fn new(doc_name: impl Into<String>, round: Round) -> Self {
        Self {
            doc_name: doc_name.into(),
            round,
            started_at: Utc::now(),
        }
    }
}

/// Observable state of a [`TaskScheduler`](crate::sched::TaskScheduler).
///
/// Transitions: `Idle → Scheduled` on construction/resume, `Scheduled → Running`
/// when a tick fires and the staleness predicate holds, `Running → Scheduled` on
/// job completion, `Scheduled/Running → Paused` on pause, `Paused → Scheduled`
/// on resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No timer armed and no job in flight.
    Idle,
    /// Timer armed, waiting for the next tick.
    Scheduled,
    /// A job is in flight; ticks are skipped until it resolves.
    Running,
    /// Timer cancelled; an in-flight job (if any) still completes.
    Paused,
}
