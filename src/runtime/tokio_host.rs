//! Tokio-backed host bridge.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::core::{HostBridge, HostEntry, SchedulerError, TimerHandle};

/// Host bridge that runs scheduler entries as tokio tasks.
///
/// Callbacks are spawned onto the runtime and timers are `tokio::time::sleep`
/// futures raced against a cancellation channel. The scheduler expects its
/// entries to run one at a time, so drive this host from a current-thread
/// runtime (the `#[tokio::test]` default) or a `LocalSet`.
#[derive(Clone)]
pub struct TokioHost {
    handle: tokio::runtime::Handle,
    timers: Arc<Mutex<HashMap<u64, oneshot::Sender<()>>>>,
    next_timer_id: Arc<AtomicU64>,
}

impl TokioHost {
    /// Create a host that spawns onto the given runtime handle.
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle,
            timers: Arc::new(Mutex::new(HashMap::new())),
            next_timer_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a host bound to the runtime of the calling context.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::Host`] when called outside a tokio runtime.
    pub fn current() -> Result<Self, SchedulerError> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| SchedulerError::Host(e.to_string()))
    }

    /// Timers armed and not yet fired or cancelled.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.lock().len()
    }
}

impl HostBridge for TokioHost {
    fn request_callback(&self, entry: HostEntry) {
        self.handle.spawn(async move { entry() });
    }

    fn request_timeout(&self, entry: HostEntry, delay_ms: f64) -> TimerHandle {
        let id = self.next_timer_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        self.timers.lock().insert(id, cancel_tx);

        let delay = Duration::try_from_secs_f64(delay_ms.max(0.0) / 1000.0).unwrap_or(Duration::MAX);
        let timers = Arc::clone(&self.timers);
        self.handle.spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => {
                    // A cancel that raced the sleep has already removed the entry.
                    if timers.lock().remove(&id).is_some() {
                        entry();
                    }
                }
                _ = cancel_rx => {}
            }
        });
        TimerHandle(id)
    }

    fn cancel_timeout(&self, handle: TimerHandle) {
        if let Some(cancel_tx) = self.timers.lock().remove(&handle.0) {
            let _ = cancel_tx.send(());
        }
    }
}
