//! Tests for utility functions

use prometheus_task_scheduler::core::Clock;
use prometheus_task_scheduler::util::{init_tracing, MonotonicClock};

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}

#[test]
fn test_monotonic_clock_never_decreases() {
    let clock = MonotonicClock::new();
    let mut last = clock.now();
    for _ in 0..1000 {
        let now = clock.now();
        assert!(now >= last);
        last = now;
    }
}
