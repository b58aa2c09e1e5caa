//! # Prometheus Task Scheduler
//!
//! A cooperative, priority-based time-slice scheduler for single-threaded hosts.
//!
//! Hosts such as UI runtimes must interleave incremental work with their own
//! responsibilities (input, rendering, I/O) without blocking them for long.
//! This crate lets callers enqueue units of work tagged with a priority and an
//! optional delay; the scheduler runs them in deadline order inside bounded
//! slices and hands control back to the host before each slice's budget runs
//! out.
//!
//! ## Key Features
//!
//! - **Deadline ordering**: each priority maps to a timeout; tasks run by
//!   `start_time + timeout`, first-scheduled first among equal deadlines
//! - **Delayed tasks**: held in a separate queue and promoted when due, with a
//!   single host timer tracking the earliest start time
//! - **Time slices**: a slice-wide frame budget (5 ms by default); overdue tasks
//!   always run, the rest wait for the next slice once the budget is spent
//! - **Continuations**: a body returns [`core::TaskOutcome::Continue`] to resume
//!   in a later slice, polling [`core::Scheduler::should_yield`] to decide when
//! - **Lazy cancellation**: cancelled tasks are tombstoned and skipped
//! - **Injected host**: the clock and the callback/timer primitives come in
//!   through [`core::Clock`] and [`core::HostBridge`]
//!
//! ## Example
//!
//! ```rust
//! use prometheus_task_scheduler::config::SchedulerConfig;
//! use prometheus_task_scheduler::core::{PriorityLevel, ScheduleOptions, Scheduler, TaskOutcome};
//! use prometheus_task_scheduler::runtime::{ManualClock, ManualHost};
//!
//! let clock = ManualClock::new();
//! let host = ManualHost::new(clock.clone());
//! let scheduler = Scheduler::new(SchedulerConfig::default(), clock, host.clone());
//!
//! let worker = scheduler.clone();
//! scheduler.schedule(PriorityLevel::UserBlocking, move |_did_timeout| {
//!     // Chunked work: stop when the slice is spent and resume later.
//!     if worker.should_yield() {
//!         return TaskOutcome::continue_with(|_| TaskOutcome::Done);
//!     }
//!     TaskOutcome::Done
//! });
//! scheduler.schedule_with_options(
//!     PriorityLevel::Low,
//!     |_| TaskOutcome::Done,
//!     ScheduleOptions::delayed(100.0),
//! );
//!
//! host.run_until_idle();
//! assert_eq!(scheduler.stats().completed_tasks, 2);
//! ```
//!
//! For complete scenarios, see `tests/scheduler_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: priorities, tasks, host contract, scheduler.
pub mod core;
/// Configuration models for the frame budget and priority timeouts.
pub mod config;
/// Builders to construct schedulers from configuration.
pub mod builders;
/// Infrastructure building blocks (ordered queues).
pub mod infra;
/// Host adapters: deterministic manual host and tokio.
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use crate::core::{
    PriorityLevel, ScheduleOptions, Scheduler, SchedulerError, TaskHandle, TaskOutcome,
};
