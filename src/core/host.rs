//! Host integration contract: the clock and callback/timer primitives the
//! scheduler consumes but does not implement.

use std::sync::Arc;

/// Work the host runs on the scheduler's behalf.
pub type HostEntry = Box<dyn FnOnce() + Send + 'static>;

/// Opaque identifier for a timer armed through [`HostBridge::request_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// Monotonic time source in milliseconds.
pub trait Clock: Send + Sync {
    /// Current time. Must never go backwards.
    fn now(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// Callback and timer primitives supplied by the embedding host.
///
/// Entries must be invoked one at a time, never re-entrantly from inside the
/// call that requested them.
pub trait HostBridge: Send + Sync {
    /// Run `entry` as soon as possible after the current synchronous turn.
    /// Arbitrary (bounded) latency is tolerated.
    fn request_callback(&self, entry: HostEntry);

    /// Run `entry` no earlier than `delay_ms` from now.
    fn request_timeout(&self, entry: HostEntry, delay_ms: f64) -> TimerHandle;

    /// Cancel a timer. Unknown or already-fired handles are ignored.
    fn cancel_timeout(&self, handle: TimerHandle);
}

impl<H: HostBridge + ?Sized> HostBridge for Arc<H> {
    fn request_callback(&self, entry: HostEntry) {
        (**self).request_callback(entry);
    }

    fn request_timeout(&self, entry: HostEntry, delay_ms: f64) -> TimerHandle {
        (**self).request_timeout(entry, delay_ms)
    }

    fn cancel_timeout(&self, handle: TimerHandle) {
        (**self).cancel_timeout(handle);
    }
}
