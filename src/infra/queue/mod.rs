//! Ordered queue backends.

pub mod memory;

pub use memory::{PriorityQueue, QueueEntry};
