//! Debounced, non-overlapping, pausable job scheduling.
//!
//! One [`TaskScheduler`] per render producer. The scheduler is a pure state
//! machine driven by the host loop: `poll` is called with the current time
//! and a lazily evaluated staleness predicate and answers whether a round
//! should start; the host launches the job and reports back through
//! `finish`. Nothing here blocks, sleeps or spawns.

pub mod spinner;

pub use spinner::SpinnerGate;

use crate::model::{Round, RunState};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Decision produced by one scheduler poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to do.
    Sleep,
    /// A tick elapsed while a job was still running; it is dropped, not
    /// queued, and staleness persists for the next tick.
    Skipped,
    /// Start a job for this round.
    Start(Round),
}

/// Debounced repeating job runner.
///
/// Guarantees at most one job in flight at any time and strictly increasing
/// round numbers. `pause` cancels only the pending timer: a running job
/// always completes and its result is still applied.
#[derive(Debug)]
pub struct TaskScheduler {
    label: &'static str,
    interval: Duration,
    paused: bool,
    stale: bool,
    run_requested: bool,
    run_forced: bool,
    running: Option<Round>,
    next_due: Option<Instant>,
    rounds: u64,
}

impl TaskScheduler {
    /// Create a scheduler with its timer armed (`Idle → Scheduled`).
    pub fn new(label: &'static str, interval: Duration, now: Instant) -> Self {
        Self {
            label,
            interval,
            paused: false,
            stale: false,
            run_requested: false,
            run_forced: false,
            running: None,
            next_due: Some(now + interval),
            rounds: 0,
        }
    }

    /// Diagnostic label ("local", "secondary").
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Current tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Derived run state.
    pub fn run_state(&self) -> RunState {
        if self.running.is_some() {
            RunState::Running
        } else if self.paused {
            RunState::Paused
        } else if self.next_due.is_some() {
            RunState::Scheduled
        } else {
            RunState::Idle
        }
    }

    /// Mark the observed condition dirty. Does not schedule anything: the
    /// predicate is re-evaluated on the next tick.
    pub fn set_stale(&mut self) {
        self.stale = true;
    }

    /// Withdraw a pending staleness mark.
    pub fn clear_stale(&mut self) {
        self.stale = false;
    }

    /// Whether a staleness mark is pending.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Cancel the pending timer. An in-flight job keeps running and its
    /// completion is still applied; pending staleness survives.
    pub fn pause(&mut self) {
        self.paused = true;
        self.next_due = None;
        debug!(scheduler = self.label, "paused");
    }

    /// Re-arm the timer, optionally changing the interval.
    pub fn resume(&mut self, interval: Option<Duration>, now: Instant) {
        if let Some(interval) = interval {
            self.interval = interval;
        }
        self.paused = false;
        self.next_due = Some(now + self.interval);
        debug!(scheduler = self.label, interval_ms = self.interval.as_millis() as u64, "resumed");
    }

    /// Change the interval without touching pause state or staleness. While
    /// paused the new interval takes effect on resume.
    pub fn set_interval(&mut self, interval: Duration, now: Instant) {
        self.interval = interval;
        if !self.paused && self.next_due.is_some() {
            self.next_due = Some(now + interval);
        }
    }

    /// Request an out-of-band execution, serialized against the tick loop.
    ///
    /// A forced request bypasses the staleness predicate and runs even while
    /// paused (pause cancels only the timer). An unforced request waits for
    /// staleness and pause like a regular tick, just without the interval
    /// delay.
    pub fn request_run(&mut self, force: bool) {
        self.run_requested = true;
        self.run_forced = self.run_forced || force;
    }

    fn timer_fired(&self, now: Instant) -> bool {
        self.next_due.is_some_and(|due| now >= due)
    }

    /// Evaluate one tick.
    ///
    /// The staleness predicate is only invoked when a tick is actually due
    /// and the scheduler's own staleness mark is not already set.
    pub fn poll<F>(&mut self, now: Instant, is_stale: F) -> TickOutcome
    where
        F: FnOnce() -> bool,
    {
        if self.running.is_some() {
            if self.timer_fired(now) {
                // No overlap, no queueing: drop the tick and re-arm.
                self.next_due = Some(now + self.interval);
                trace!(scheduler = self.label, "tick skipped while job running");
                return TickOutcome::Skipped;
            }
            return TickOutcome::Sleep;
        }

        let ticked = !self.paused && self.timer_fired(now);
        let requested = self.run_requested && (self.run_forced || !self.paused);
        if !ticked && !requested {
            return TickOutcome::Sleep;
        }

        let forced = requested && self.run_forced;
        if !forced && !(self.stale || is_stale()) {
            // Consume the tick (and any unforced request) without running.
            if ticked {
                self.next_due = Some(now + self.interval);
            }
            self.run_requested = false;
            return TickOutcome::Sleep;
        }

        self.run_requested = false;
        self.run_forced = false;
        self.stale = false;
        self.rounds += 1;
        let round = Round::new(self.rounds);
        self.running = Some(round);
        if !self.paused {
            self.next_due = Some(now + self.interval);
        }
        debug!(scheduler = self.label, round = self.rounds, forced, "round started");
        TickOutcome::Start(round)
    }

    /// Report job completion (success or failure alike): `Running →
    /// Scheduled`, or back to `Paused` if paused mid-run.
    pub fn finish(&mut self, now: Instant) -> Option<Round> {
        let round = self.running.take();
        if round.is_some() && !self.paused && self.next_due.is_none() {
            self.next_due = Some(now + self.interval);
        }
        if let Some(round) = round {
            debug!(scheduler = self.label, round = round.get(), "round finished");
        }
        round
    }
}

// ===== Tests =====

#[cfg(test)]
#[path = "sched_tests.rs"]
mod tests;
