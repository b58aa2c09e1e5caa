//! Tests for the tokio host bridge

use std::time::Duration;

use prometheus_task_scheduler::config::SchedulerConfig;
use prometheus_task_scheduler::core::{PriorityLevel, ScheduleOptions, Scheduler, TaskOutcome};
use prometheus_task_scheduler::runtime::TokioHost;
use prometheus_task_scheduler::util::MonotonicClock;

fn tokio_scheduler() -> (Scheduler, TokioHost) {
    let host = TokioHost::current().expect("inside a tokio runtime");
    let scheduler = Scheduler::new(SchedulerConfig::default(), MonotonicClock::new(), host.clone());
    (scheduler, host)
}

#[test]
fn test_tokio_host_requires_runtime() {
    assert!(TokioHost::current().is_err());
}

#[tokio::test]
async fn test_tokio_host_runs_ready_before_delayed() {
    let (scheduler, _host) = tokio_scheduler();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let delayed_tx = tx.clone();
    scheduler.schedule_with_options(
        PriorityLevel::Immediate,
        move |_| {
            delayed_tx.send("delayed").unwrap();
            TaskOutcome::Done
        },
        ScheduleOptions::delayed(20.0),
    );
    let ready_tx = tx.clone();
    scheduler.schedule(PriorityLevel::Idle, move |_| {
        ready_tx.send("ready").unwrap();
        TaskOutcome::Done
    });

    let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("first task ran");
    let second = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("second task ran");
    assert_eq!(first, Some("ready"));
    assert_eq!(second, Some("delayed"));
}

#[tokio::test]
async fn test_tokio_host_cancelled_delayed_task_never_runs() {
    let (scheduler, host) = tokio_scheduler();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<&str>();

    let handle = scheduler.schedule_with_options(
        PriorityLevel::Normal,
        move |_| {
            tx.send("ran").unwrap();
            TaskOutcome::Done
        },
        ScheduleOptions::delayed(10.0),
    );
    assert_eq!(host.pending_timers(), 1);
    scheduler.cancel(&handle);

    let result = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    // Cancelling drops the body and its sender, so the channel closes unsent.
    assert!(!matches!(result, Ok(Some(_))));
    assert!(handle.is_cancelled());
}
