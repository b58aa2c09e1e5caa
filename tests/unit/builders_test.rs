//! Tests for scheduler builders

use prometheus_task_scheduler::builders::build_scheduler;
use prometheus_task_scheduler::config::SchedulerConfig;
use prometheus_task_scheduler::core::SchedulerError;
use prometheus_task_scheduler::runtime::{ManualClock, ManualHost};

#[test]
fn test_build_scheduler_from_valid_config() {
    let clock = ManualClock::new();
    let host = ManualHost::new(clock.clone());
    let cfg = SchedulerConfig::default().with_frame_budget_ms(16.0);

    let scheduler = build_scheduler(&cfg, clock, host).unwrap();
    assert_eq!(scheduler.frame_budget_ms(), 16.0);
}

#[test]
fn test_build_scheduler_rejects_invalid_config() {
    let clock = ManualClock::new();
    let host = ManualHost::new(clock.clone());
    let cfg = SchedulerConfig::default().with_frame_budget_ms(0.0);

    let result = build_scheduler(&cfg, clock, host);
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}
