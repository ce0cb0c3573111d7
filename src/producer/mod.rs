//! Render producers.
//!
//! A producer is started with a [`RenderRequest`] and observed through a
//! non-blocking `poll`, mirroring how the shell observes every other input.
//! The scheduler serializes rounds, so a producer never has more than one
//! job in flight.

pub mod command;
pub mod local;

pub use command::CommandProducer;
pub use local::BlockRenderer;

use crate::model::{JobError, RenderOutcome, RenderRequest};
use std::time::Duration;

/// Asynchronous render producer seam.
pub trait RenderProducer {
    /// Kick off one render round. Fails fast (e.g. spawn failure); slow
    /// failures surface through `poll`.
    fn begin(&mut self, request: RenderRequest) -> Result<(), JobError>;

    /// Non-blocking completion check. Returns the finished round's outcome
    /// at most once.
    fn poll(&mut self) -> Option<Result<RenderOutcome, JobError>>;
}

/// Exponentially weighted moving average of render durations.
///
/// Producers report this with every outcome; the orchestrator's adaptive
/// refresh policy keys off it.
pub(crate) fn ewma(previous: Option<Duration>, sample: Duration) -> Duration {
    match previous {
        None => sample,
        Some(prev) => Duration::from_secs_f64(prev.as_secs_f64() * 0.7 + sample.as_secs_f64() * 0.3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ewma_starts_at_the_first_sample() {
        assert_eq!(ewma(None, Duration::from_millis(100)), Duration::from_millis(100));
    }

    #[test]
    fn ewma_moves_toward_new_samples() {
        let avg = ewma(Some(Duration::from_millis(100)), Duration::from_millis(200));
        assert!(avg > Duration::from_millis(100));
        assert!(avg < Duration::from_millis(200));
    }
}
