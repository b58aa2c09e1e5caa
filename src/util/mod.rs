//! Shared utilities.

pub mod clock;
pub mod telemetry;

pub use clock::MonotonicClock;
pub use telemetry::init_tracing;
