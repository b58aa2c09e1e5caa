//! Core scheduling abstractions: priorities, tasks, the host contract, and
//! the scheduler itself.

pub mod error;
pub mod host;
pub mod priority;
pub mod scheduler;
pub mod task;

pub use error::{AppResult, SchedulerError};
pub use host::{Clock, HostBridge, HostEntry, TimerHandle};
pub use priority::PriorityLevel;
pub use scheduler::{ScheduleOptions, Scheduler, SchedulerStats, MAX_FRAME_RATE};
pub use task::{TaskCallback, TaskHandle, TaskId, TaskOutcome, TaskStatus};
