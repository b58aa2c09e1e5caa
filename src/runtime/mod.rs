//! Host adapters that drive the scheduler's entry points.

pub mod manual;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_host;

pub use manual::{ManualClock, ManualHost};
#[cfg(feature = "tokio-runtime")]
pub use tokio_host::TokioHost;
