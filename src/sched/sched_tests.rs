//! Scheduler state-machine tests over a simulated clock.

use super::*;
use std::time::{Duration, Instant};

const INTERVAL: Duration = Duration::from_millis(500);

fn at(t0: Instant, ms: u64) -> Instant {
    t0 + Duration::from_millis(ms)
}

fn sched(t0: Instant) -> TaskScheduler {
    TaskScheduler::new("test", INTERVAL, t0)
}

#[test]
fn construction_arms_the_timer() {
    let t0 = Instant::now();
    let s = sched(t0);
    assert_eq!(s.run_state(), RunState::Scheduled);
}

#[test]
fn tick_does_not_fire_before_the_interval() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    assert_eq!(s.poll(at(t0, 499), || true), TickOutcome::Sleep);
}

#[test]
fn stale_tick_starts_a_round() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    match s.poll(at(t0, 500), || true) {
        TickOutcome::Start(round) => assert_eq!(round.get(), 1),
        other => panic!("expected Start, got {other:?}"),
    }
    assert_eq!(s.run_state(), RunState::Running);
}

#[test]
fn fresh_tick_with_nothing_stale_sleeps() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    assert_eq!(s.poll(at(t0, 500), || false), TickOutcome::Sleep);
    // Tick was consumed: the next one is a full interval later.
    assert_eq!(s.poll(at(t0, 999), || true), TickOutcome::Sleep);
    assert!(matches!(s.poll(at(t0, 1000), || true), TickOutcome::Start(_)));
}

#[test]
fn predicate_is_not_evaluated_before_a_tick_is_due() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    let mut evaluated = false;
    let _ = s.poll(at(t0, 100), || {
        evaluated = true;
        true
    });
    assert!(!evaluated, "predicate must be evaluated lazily, on ticks only");
}

#[test]
fn no_overlap_tick_during_run_is_skipped_not_queued() {
    // interval=500, job runs from t=500 to t=2500: the tick at t=1000 is
    // skipped and staleness persists for the tick after completion.
    let t0 = Instant::now();
    let mut s = sched(t0);
    assert!(matches!(s.poll(at(t0, 500), || true), TickOutcome::Start(_)));

    assert_eq!(s.poll(at(t0, 1000), || true), TickOutcome::Skipped);
    assert_eq!(s.poll(at(t0, 1100), || true), TickOutcome::Sleep);
    assert_eq!(s.poll(at(t0, 1500), || true), TickOutcome::Skipped);

    assert_eq!(s.finish(at(t0, 2500)).map(|r| r.get()), Some(1));
    assert_eq!(s.run_state(), RunState::Scheduled);

    // Staleness persisted; next due tick starts round 2.
    match s.poll(at(t0, 2500), || true) {
        TickOutcome::Start(round) => assert_eq!(round.get(), 2),
        other => panic!("expected Start, got {other:?}"),
    }
}

#[test]
fn rounds_are_strictly_increasing() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    let mut seen = Vec::new();
    let mut clock = 0;
    for _ in 0..5 {
        clock += 500;
        if let TickOutcome::Start(round) = s.poll(at(t0, clock), || true) {
            seen.push(round.get());
            clock += 10;
            s.finish(at(t0, clock));
        }
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
}

#[test]
fn pause_cancels_the_pending_timer_only() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    s.pause();
    assert_eq!(s.run_state(), RunState::Paused);
    assert_eq!(s.poll(at(t0, 5000), || true), TickOutcome::Sleep);
}

#[test]
fn pause_then_resume_keeps_the_interval_with_no_tick_between() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    s.pause();
    s.resume(None, at(t0, 100));
    // No tick strictly between pause and resume, and the old interval holds:
    // next tick is at resume + 500.
    assert_eq!(s.poll(at(t0, 500), || true), TickOutcome::Sleep);
    assert_eq!(s.poll(at(t0, 599), || true), TickOutcome::Sleep);
    assert!(matches!(s.poll(at(t0, 600), || true), TickOutcome::Start(_)));
}

#[test]
fn resume_can_change_the_interval() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    s.pause();
    s.resume(Some(Duration::from_millis(100)), at(t0, 0));
    assert!(matches!(s.poll(at(t0, 100), || true), TickOutcome::Start(_)));
    assert_eq!(s.interval(), Duration::from_millis(100));
}

#[test]
fn interval_change_while_paused_keeps_staleness() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    s.set_stale();
    s.pause();
    s.set_interval(Duration::from_millis(200), at(t0, 0));
    assert!(s.is_stale(), "staleness survives interval changes mid-pause");
    s.resume(None, at(t0, 1000));
    assert!(matches!(s.poll(at(t0, 1200), || false), TickOutcome::Start(_)));
}

#[test]
fn job_finishing_while_paused_does_not_rearm() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    assert!(matches!(s.poll(at(t0, 500), || true), TickOutcome::Start(_)));
    s.pause();
    // The in-flight job completes and its result is applied by the host; the
    // scheduler just returns to Paused.
    assert!(s.finish(at(t0, 700)).is_some());
    assert_eq!(s.run_state(), RunState::Paused);
    assert_eq!(s.poll(at(t0, 9000), || true), TickOutcome::Sleep);
}

#[test]
fn forced_run_bypasses_staleness_and_interval() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    s.request_run(true);
    assert!(matches!(s.poll(at(t0, 1), || false), TickOutcome::Start(_)));
}

#[test]
fn forced_run_executes_even_while_paused() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    s.pause();
    s.request_run(true);
    assert!(matches!(s.poll(at(t0, 1), || false), TickOutcome::Start(_)));
    // Completion while paused leaves the timer disarmed.
    s.finish(at(t0, 50));
    assert_eq!(s.run_state(), RunState::Paused);
}

#[test]
fn forced_run_is_serialized_against_a_running_job() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    assert!(matches!(s.poll(at(t0, 500), || true), TickOutcome::Start(_)));
    s.request_run(true);
    // Still running: nothing starts.
    assert!(!matches!(s.poll(at(t0, 600), || true), TickOutcome::Start(_)));
    s.finish(at(t0, 700));
    // Now the pending forced request fires.
    assert!(matches!(s.poll(at(t0, 701), || false), TickOutcome::Start(_)));
}

#[test]
fn unforced_request_respects_staleness() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    s.request_run(false);
    assert_eq!(s.poll(at(t0, 1), || false), TickOutcome::Sleep);
    // The request was consumed; a later stale tick still works normally.
    assert!(matches!(s.poll(at(t0, 500), || true), TickOutcome::Start(_)));
}

#[test]
fn unforced_request_runs_promptly_when_stale() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    s.set_stale();
    s.request_run(false);
    assert!(matches!(s.poll(at(t0, 1), || false), TickOutcome::Start(_)));
}

#[test]
fn set_stale_alone_does_not_run_between_ticks() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    s.set_stale();
    assert_eq!(s.poll(at(t0, 100), || false), TickOutcome::Sleep);
    assert!(matches!(s.poll(at(t0, 500), || false), TickOutcome::Start(_)));
}

#[test]
fn clear_stale_withdraws_the_mark() {
    let t0 = Instant::now();
    let mut s = sched(t0);
    s.set_stale();
    s.clear_stale();
    assert_eq!(s.poll(at(t0, 500), || false), TickOutcome::Sleep);
}
