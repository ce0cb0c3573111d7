//! Property-based tests for scheduler serialization.
//!
//! For any tick/poll sequence, a scheduler never starts a round while a
//! previous round is unresolved, and round numbers are strictly
//! increasing. The simulation drives the state machine over a synthetic
//! clock with randomized poll cadence and job durations.

use proptest::prelude::*;
use pvsync::sched::{TaskScheduler, TickOutcome};
use std::time::{Duration, Instant};

proptest! {
    #[test]
    fn rounds_never_overlap_and_increase(
        steps in prop::collection::vec(10u64..800, 1..60),
        job_ms in 1u64..900,
        interval_ms in 50u64..700,
    ) {
        let t0 = Instant::now();
        let mut sched = TaskScheduler::new("prop", Duration::from_millis(interval_ms), t0);
        let mut clock = 0u64;
        let mut running_until: Option<u64> = None;
        let mut last_round = 0u64;

        for step in steps {
            clock += step;
            let now = t0 + Duration::from_millis(clock);

            // Resolve a job whose duration has elapsed.
            if let Some(done) = running_until {
                if clock >= done {
                    let finished = sched.finish(now);
                    prop_assert!(finished.is_some());
                    running_until = None;
                }
            }

            match sched.poll(now, || true) {
                TickOutcome::Start(round) => {
                    prop_assert!(
                        running_until.is_none(),
                        "round {} started while another was unresolved",
                        round.get()
                    );
                    prop_assert_eq!(round.get(), last_round + 1, "rounds must be strictly increasing");
                    last_round = round.get();
                    running_until = Some(clock + job_ms);
                }
                TickOutcome::Skipped => {
                    prop_assert!(
                        running_until.is_some(),
                        "ticks are only skipped while a job is running"
                    );
                }
                TickOutcome::Sleep => {}
            }
        }
    }

    #[test]
    fn pause_windows_never_start_rounds(
        before in 1u64..2000,
        during in 1u64..2000,
        after in 1u64..2000,
    ) {
        let t0 = Instant::now();
        let mut sched = TaskScheduler::new("prop", Duration::from_millis(100), t0);
        let mut clock = 0u64;

        // Run freely for a while; resolve whatever round that started.
        clock += before;
        let _ = sched.poll(t0 + Duration::from_millis(clock), || true);
        let _ = sched.finish(t0 + Duration::from_millis(clock));

        sched.pause();
        let pause_start = clock;
        // Poll densely through the pause window: nothing may start.
        for offset in (0..during).step_by(37) {
            let now = t0 + Duration::from_millis(pause_start + offset + 1);
            let outcome = sched.poll(now, || true);
            prop_assert!(
                !matches!(outcome, TickOutcome::Start(_)),
                "no round may start while paused"
            );
        }
        clock += during;

        // Resume re-arms: within one interval a stale round starts again.
        sched.resume(None, t0 + Duration::from_millis(clock));
        clock += 100.max(after % 500);
        let started = matches!(
            sched.poll(t0 + Duration::from_millis(clock), || true),
            TickOutcome::Start(_)
        );
        prop_assert!(started, "stale scheduler must run after resume + interval");
    }
}
