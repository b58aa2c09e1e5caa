//! Deterministic host for simulations and tests.
//!
//! [`ManualHost`] queues callback and timer requests instead of running them;
//! the embedding code decides when to pump them and how far to move
//! [`ManualClock`].

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{Clock, HostBridge, HostEntry, TimerHandle};

/// Simulated monotonic clock in milliseconds. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<f64>>,
}

impl ManualClock {
    /// A clock starting at `0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock starting at `start_ms`.
    #[must_use]
    pub fn starting_at(start_ms: f64) -> Self {
        Self {
            now: Arc::new(Mutex::new(start_ms)),
        }
    }

    /// Move time forward by `ms`. Negative values are ignored.
    pub fn advance(&self, ms: f64) {
        if ms > 0.0 {
            *self.now.lock() += ms;
        }
    }

    /// Move time forward to `ms`. Earlier values are ignored so the clock
    /// never runs backwards.
    pub fn set(&self, ms: f64) {
        let mut now = self.now.lock();
        if ms > *now {
            *now = ms;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock()
    }
}

struct PendingTimer {
    handle: TimerHandle,
    deadline: f64,
    entry: HostEntry,
}

#[derive(Default)]
struct ManualHostState {
    callbacks: VecDeque<HostEntry>,
    timers: Vec<PendingTimer>,
    next_timer_id: u64,
    callbacks_requested: u64,
    timers_requested: u64,
    timers_cancelled: u64,
}

/// Host bridge that records requests and runs them only when asked.
///
/// Entries always run with no internal lock held, so they may request more
/// callbacks and timers while running.
#[derive(Clone)]
pub struct ManualHost {
    clock: ManualClock,
    state: Arc<Mutex<ManualHostState>>,
}

impl ManualHost {
    /// Create a host whose timers are measured against `clock`.
    #[must_use]
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            state: Arc::new(Mutex::new(ManualHostState::default())),
        }
    }

    /// The clock this host advances.
    #[must_use]
    pub const fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Callbacks waiting to run.
    #[must_use]
    pub fn pending_callbacks(&self) -> usize {
        self.state.lock().callbacks.len()
    }

    /// Timers armed and not yet fired or cancelled.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.state.lock().timers.len()
    }

    /// Deadline of the earliest armed timer.
    #[must_use]
    pub fn next_timer_deadline(&self) -> Option<f64> {
        self.state
            .lock()
            .timers
            .iter()
            .map(|timer| timer.deadline)
            .min_by(f64::total_cmp)
    }

    /// Total callback requests received.
    #[must_use]
    pub fn callbacks_requested(&self) -> u64 {
        self.state.lock().callbacks_requested
    }

    /// Total timer requests received.
    #[must_use]
    pub fn timers_requested(&self) -> u64 {
        self.state.lock().timers_requested
    }

    /// Total timers cancelled before firing.
    #[must_use]
    pub fn timers_cancelled(&self) -> u64 {
        self.state.lock().timers_cancelled
    }

    /// Run the oldest pending callback. Returns false if there was none.
    pub fn run_next_callback(&self) -> bool {
        let entry = self.state.lock().callbacks.pop_front();
        entry.is_some_and(|entry| {
            entry();
            true
        })
    }

    /// Run callbacks until none are pending, including ones requested while
    /// flushing. Returns how many ran.
    pub fn flush_callbacks(&self) -> usize {
        let mut ran = 0;
        while self.run_next_callback() {
            ran += 1;
        }
        ran
    }

    /// Advance the clock by `ms`, firing timers that come due on the way.
    /// Callbacks requested by those timers are left pending.
    pub fn advance_by(&self, ms: f64) -> usize {
        self.advance_to(self.clock.now() + ms.max(0.0))
    }

    /// Advance the clock to `target_ms`, firing due timers in deadline order
    /// with the clock set to each deadline. Returns how many fired.
    pub fn advance_to(&self, target_ms: f64) -> usize {
        let mut fired = 0;
        while let Some(timer) = self.take_earliest_timer(Some(target_ms)) {
            self.clock.set(timer.deadline);
            (timer.entry)();
            fired += 1;
        }
        self.clock.set(target_ms);
        fired
    }

    /// Jump to the earliest timer's deadline and fire it. Returns false when
    /// no timer is armed.
    pub fn fire_next_timer(&self) -> bool {
        self.take_earliest_timer(None).is_some_and(|timer| {
            self.clock.set(timer.deadline);
            (timer.entry)();
            true
        })
    }

    /// Alternate flushing callbacks and firing timers until neither remains.
    pub fn run_until_idle(&self) {
        loop {
            self.flush_callbacks();
            if !self.fire_next_timer() {
                break;
            }
        }
    }

    fn take_earliest_timer(&self, limit: Option<f64>) -> Option<PendingTimer> {
        let mut state = self.state.lock();
        let index = state
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| limit.is_none_or(|limit| timer.deadline <= limit))
            .min_by(|(_, a), (_, b)| {
                a.deadline
                    .total_cmp(&b.deadline)
                    .then_with(|| a.handle.cmp(&b.handle))
            })
            .map(|(index, _)| index)?;
        Some(state.timers.swap_remove(index))
    }
}

impl HostBridge for ManualHost {
    fn request_callback(&self, entry: HostEntry) {
        let mut state = self.state.lock();
        state.callbacks_requested += 1;
        state.callbacks.push_back(entry);
    }

    fn request_timeout(&self, entry: HostEntry, delay_ms: f64) -> TimerHandle {
        let deadline = self.clock.now() + delay_ms.max(0.0);
        let mut state = self.state.lock();
        state.next_timer_id += 1;
        state.timers_requested += 1;
        let handle = TimerHandle(state.next_timer_id);
        // A timer that can never fire would drag the clock to infinity.
        if !deadline.is_finite() {
            return handle;
        }
        state.timers.push(PendingTimer {
            handle,
            deadline,
            entry,
        });
        handle
    }

    fn cancel_timeout(&self, handle: TimerHandle) {
        let mut state = self.state.lock();
        if let Some(index) = state.timers.iter().position(|timer| timer.handle == handle) {
            state.timers.swap_remove(index);
            state.timers_cancelled += 1;
        }
    }
}
