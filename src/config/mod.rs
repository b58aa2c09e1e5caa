//! Configuration models for the frame budget and priority timeouts.

pub mod scheduler;

pub use scheduler::{PriorityTimeouts, SchedulerConfig, DEFAULT_FRAME_BUDGET_MS};
