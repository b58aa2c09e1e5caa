//! Infrastructure building blocks for the scheduling core.

pub mod queue;
pub use queue::PriorityQueue;
