//! Cooperative time-slice scheduler.
//!
//! Tasks live in one of two min-heaps:
//!
//! - the **ready queue**, keyed by expiration time, holds tasks eligible to run;
//! - the **delay queue**, keyed by start time, holds tasks whose delay has not
//!   elapsed yet.
//!
//! The host drives the scheduler through two entry points handed to its
//! [`HostBridge`]: a "run soon" callback that drains the ready queue for one
//! slice, and a one-shot timer that promotes delayed tasks once the earliest of
//! them becomes eligible. A slice ends when the ready queue is empty or when
//! the frame budget is spent and the head task is not yet overdue.
//!
//! Cancellation never touches heap structure: the task is tombstoned and
//! discarded when it next surfaces at a queue head.

use std::sync::{Arc, Weak};
use std::thread;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::{PriorityTimeouts, SchedulerConfig};
use crate::core::host::{Clock, HostBridge, TimerHandle};
use crate::core::task::{Task, TaskHandle, TaskOutcome, TaskRegistry};
use crate::core::{PriorityLevel, SchedulerError};
use crate::infra::queue::PriorityQueue;

/// Highest frame rate accepted by [`Scheduler::force_frame_rate`].
pub const MAX_FRAME_RATE: u32 = 125;

/// Optional admission parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOptions {
    /// Delay in milliseconds before the task becomes eligible.
    pub delay: Option<f64>,
}

impl ScheduleOptions {
    /// Options with the given delay.
    #[must_use]
    pub const fn delayed(delay_ms: f64) -> Self {
        Self {
            delay: Some(delay_ms),
        }
    }

    /// The delay actually applied: absent, negative, or NaN delays are zero.
    /// An infinite delay is kept; such a task is parked and never comes due.
    #[must_use]
    pub fn effective_delay(&self) -> f64 {
        match self.delay {
            Some(delay) if delay > 0.0 => delay,
            _ => 0.0,
        }
    }
}

/// Point-in-time view of scheduler activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Entries in the ready queue, tombstones included.
    pub ready_tasks: usize,
    /// Entries in the delay queue, tombstones included.
    pub delayed_tasks: usize,
    /// Tasks admitted since creation.
    pub scheduled_tasks: u64,
    /// Tasks whose body returned `Done`.
    pub completed_tasks: u64,
    /// Tasks tombstoned by `cancel`.
    pub cancelled_tasks: u64,
    /// Continuations stored for a later slice.
    pub continued_tasks: u64,
    /// Host callback slices run.
    pub slices: u64,
}

#[derive(Debug, Default)]
struct Counters {
    scheduled: u64,
    completed: u64,
    cancelled: u64,
    continued: u64,
    slices: u64,
}

/// Mutable scheduler state, guarded by one mutex that is never held while a
/// task body runs.
struct CoreState {
    registry: TaskRegistry,
    ready: PriorityQueue<Arc<Task>>,
    delayed: PriorityQueue<Arc<Task>>,
    current_task: Option<Arc<Task>>,
    current_priority: PriorityLevel,
    slice_start: f64,
    frame_budget_ms: f64,
    host_callback_pending: bool,
    performing_work: bool,
    timer: Option<TimerHandle>,
    paused: bool,
    needs_paint: bool,
    counters: Counters,
}

impl CoreState {
    fn new(frame_budget_ms: f64) -> Self {
        Self {
            registry: TaskRegistry::default(),
            ready: PriorityQueue::new(),
            delayed: PriorityQueue::new(),
            current_task: None,
            current_priority: PriorityLevel::NoPriority,
            slice_start: 0.0,
            frame_budget_ms,
            host_callback_pending: false,
            performing_work: false,
            timer: None,
            paused: false,
            needs_paint: false,
            counters: Counters::default(),
        }
    }

    fn should_yield_at(&self, now: f64) -> bool {
        self.needs_paint || now - self.slice_start >= self.frame_budget_ms
    }

    /// Move every delayed task whose start time has arrived into the ready
    /// queue, dropping tombstones on the way.
    fn promote_due(&mut self, current_time: f64) {
        while let Some(head) = self.delayed.peek() {
            if head.item.is_tombstone() {
                trace!(task_id = head.id, "dropping cancelled delayed task");
                self.delayed.pop();
                continue;
            }
            if head.item.start_time > current_time {
                break;
            }
            if let Some(entry) = self.delayed.pop() {
                let task = entry.item;
                trace!(
                    task_id = task.id,
                    start_time = task.start_time,
                    current_time,
                    "promoting delayed task"
                );
                self.ready.push(task.expiration_time, task.id, task);
            }
        }
    }

    fn next_start_time(&self) -> Option<f64> {
        self.delayed.peek().map(|entry| entry.sort_index)
    }

    fn is_ready_head(&self, task: &Arc<Task>) -> bool {
        self.ready
            .peek()
            .is_some_and(|entry| Arc::ptr_eq(&entry.item, task))
    }
}

struct Inner {
    clock: Arc<dyn Clock>,
    host: Arc<dyn HostBridge>,
    timeouts: PriorityTimeouts,
    default_frame_budget_ms: f64,
    state: Mutex<CoreState>,
}

/// Cooperative, priority-based task scheduler.
///
/// Cloning yields another handle to the same scheduler, which is how task
/// bodies reach back in to schedule follow-up work or check
/// [`Scheduler::should_yield`].
///
/// # Example
///
/// ```rust
/// use prometheus_task_scheduler::config::SchedulerConfig;
/// use prometheus_task_scheduler::core::{PriorityLevel, Scheduler, TaskOutcome};
/// use prometheus_task_scheduler::runtime::{ManualClock, ManualHost};
///
/// let clock = ManualClock::new();
/// let host = ManualHost::new(clock.clone());
/// let scheduler = Scheduler::new(SchedulerConfig::default(), clock, host.clone());
///
/// scheduler.schedule(PriorityLevel::Normal, |_did_timeout| TaskOutcome::Done);
/// host.run_until_idle();
/// assert_eq!(scheduler.stats().completed_tasks, 1);
/// ```
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Create a scheduler from a configuration, a clock, and a host bridge.
    ///
    /// The configuration is used as given; [`crate::builders::build_scheduler`]
    /// validates it first.
    pub fn new<C, H>(config: SchedulerConfig, clock: C, host: H) -> Self
    where
        C: Clock + 'static,
        H: HostBridge + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                clock: Arc::new(clock),
                host: Arc::new(host),
                timeouts: config.timeouts,
                default_frame_budget_ms: config.frame_budget_ms,
                state: Mutex::new(CoreState::new(config.frame_budget_ms)),
            }),
        }
    }

    /// Current time according to the injected clock.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.inner.clock.now()
    }

    /// Schedule `callback` to run at `priority` as soon as it is its turn.
    pub fn schedule<F>(&self, priority: PriorityLevel, callback: F) -> TaskHandle
    where
        F: FnOnce(bool) -> TaskOutcome + Send + 'static,
    {
        self.schedule_with_options(priority, callback, ScheduleOptions::default())
    }

    /// Schedule `callback` with explicit options, such as a start delay.
    ///
    /// Admission never fails: unrecognized priorities get the normal timeout
    /// and invalid delays count as zero.
    pub fn schedule_with_options<F>(
        &self,
        priority: PriorityLevel,
        callback: F,
        options: ScheduleOptions,
    ) -> TaskHandle
    where
        F: FnOnce(bool) -> TaskOutcome + Send + 'static,
    {
        let now = self.now();
        let start_time = now + options.effective_delay();
        let expiration_time = start_time + self.inner.timeouts.timeout_for(priority);

        let mut state = self.inner.state.lock();
        let task = state
            .registry
            .register(priority, Box::new(callback), start_time, expiration_time);
        state.counters.scheduled += 1;
        let handle = TaskHandle::new(Arc::clone(&task));

        if start_time > now {
            debug!(
                task_id = task.id,
                %priority,
                start_time,
                expiration_time,
                "scheduled delayed task"
            );
            let id = task.id;
            state.delayed.push(start_time, id, task);
            let is_delay_head = state.delayed.peek().is_some_and(|entry| entry.id == id);
            if is_delay_head && state.ready.is_empty() {
                let stale = state.timer.take();
                drop(state);
                self.arm_timer(stale, start_time - now);
            }
        } else {
            debug!(
                task_id = task.id,
                %priority,
                expiration_time,
                "scheduled ready task"
            );
            state.ready.push(expiration_time, task.id, task);
            if !state.host_callback_pending && !state.performing_work {
                state.host_callback_pending = true;
                drop(state);
                self.request_host_callback();
            }
        }
        handle
    }

    /// Cancel a task. Its body will never run; the queue entry is discarded
    /// lazily. Cancelling a finished or already-cancelled task does nothing.
    ///
    /// A task cancelled from inside its own body runs to the end of that
    /// invocation, and any continuation it returns is dropped.
    pub fn cancel(&self, handle: &TaskHandle) {
        if handle.task().cancel() {
            self.inner.state.lock().counters.cancelled += 1;
            debug!(task_id = handle.id(), "cancelled task");
        }
    }

    /// Priority of the task currently executing, or
    /// [`PriorityLevel::NoPriority`] when idle.
    #[must_use]
    pub fn current_priority_level(&self) -> PriorityLevel {
        self.inner.state.lock().current_priority
    }

    /// True once the current slice has used up its frame budget, or a paint
    /// was requested. Long-running bodies poll this and return a continuation.
    #[must_use]
    pub fn should_yield(&self) -> bool {
        let now = self.now();
        self.inner.state.lock().should_yield_at(now)
    }

    /// Ask the scheduler to yield at the next opportunity so the host can
    /// paint. Cleared when the next slice starts.
    pub fn request_paint(&self) {
        self.inner.state.lock().needs_paint = true;
    }

    /// Run `f` with the current priority level set to `priority`, restoring the
    /// previous level afterwards. `NoPriority` is treated as `Normal`.
    pub fn run_with_priority<R>(&self, priority: PriorityLevel, f: impl FnOnce() -> R) -> R {
        let priority = match priority {
            PriorityLevel::NoPriority => PriorityLevel::Normal,
            other => other,
        };
        self.with_priority_level(priority, f)
    }

    /// Run `f` one step less urgently: at `Normal` when the current level is
    /// `Immediate`, `UserBlocking` or `Normal` (or none), else at the current
    /// level.
    pub fn next<R>(&self, f: impl FnOnce() -> R) -> R {
        let priority = match self.current_priority_level() {
            PriorityLevel::Immediate
            | PriorityLevel::UserBlocking
            | PriorityLevel::Normal
            | PriorityLevel::NoPriority => PriorityLevel::Normal,
            other => other,
        };
        self.with_priority_level(priority, f)
    }

    /// Capture the current priority level and return a closure that runs `f`
    /// under it, wherever it is eventually called from.
    pub fn wrap_callback<F, R>(&self, f: F) -> impl FnOnce() -> R + Send + 'static
    where
        F: FnOnce() -> R + Send + 'static,
        R: 'static,
    {
        let scheduler = self.clone();
        let priority = self.current_priority_level();
        move || scheduler.with_priority_level(priority, f)
    }

    fn with_priority_level<R>(&self, priority: PriorityLevel, f: impl FnOnce() -> R) -> R {
        let previous = {
            let mut state = self.inner.state.lock();
            std::mem::replace(&mut state.current_priority, priority)
        };
        let _restore = PriorityScope {
            scheduler: self,
            previous,
        };
        f()
    }

    /// Stop draining the ready queue. Admission and timers keep working.
    pub fn pause_execution(&self) {
        debug!("scheduler paused");
        self.inner.state.lock().paused = true;
    }

    /// Resume draining after [`Scheduler::pause_execution`].
    pub fn continue_execution(&self) {
        let mut state = self.inner.state.lock();
        state.paused = false;
        debug!("scheduler resumed");
        if !state.ready.is_empty() && !state.host_callback_pending && !state.performing_work {
            state.host_callback_pending = true;
            drop(state);
            self.request_host_callback();
        }
    }

    /// Override the frame budget to match a target frame rate. `0` restores
    /// the configured budget.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidFrameRate`] above [`MAX_FRAME_RATE`].
    pub fn force_frame_rate(&self, fps: u32) -> Result<(), SchedulerError> {
        if fps > MAX_FRAME_RATE {
            warn!(fps, "frame rates above {MAX_FRAME_RATE} fps are not supported");
            return Err(SchedulerError::InvalidFrameRate(fps));
        }
        let budget = if fps == 0 {
            self.inner.default_frame_budget_ms
        } else {
            (1000.0 / f64::from(fps)).floor()
        };
        self.inner.state.lock().frame_budget_ms = budget;
        debug!(fps, frame_budget_ms = budget, "frame budget updated");
        Ok(())
    }

    /// Current slice budget in milliseconds.
    #[must_use]
    pub fn frame_budget_ms(&self) -> f64 {
        self.inner.state.lock().frame_budget_ms
    }

    /// Handle to the task at the head of the ready queue, if any. The head may
    /// be a cancelled task that has not been discarded yet.
    #[must_use]
    pub fn peek_first_task(&self) -> Option<TaskHandle> {
        self.inner
            .state
            .lock()
            .ready
            .peek()
            .map(|entry| TaskHandle::new(Arc::clone(&entry.item)))
    }

    /// Snapshot of queue depths and lifetime counters.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let state = self.inner.state.lock();
        SchedulerStats {
            ready_tasks: state.ready.len(),
            delayed_tasks: state.delayed.len(),
            scheduled_tasks: state.counters.scheduled,
            completed_tasks: state.counters.completed,
            cancelled_tasks: state.counters.cancelled,
            continued_tasks: state.counters.continued,
            slices: state.counters.slices,
        }
    }

    fn request_host_callback(&self) {
        trace!("requesting host callback");
        let weak = Arc::downgrade(&self.inner);
        self.inner.host.request_callback(Box::new(move || {
            if let Some(scheduler) = Self::upgrade(&weak) {
                scheduler.perform_work_until_deadline();
            }
        }));
    }

    fn arm_timer(&self, stale: Option<TimerHandle>, delay_ms: f64) {
        if let Some(handle) = stale {
            trace!(?handle, "cancelling stale host timer");
            self.inner.host.cancel_timeout(handle);
        }
        // An infinite start time never comes due.
        if !delay_ms.is_finite() {
            trace!(delay_ms, "delay head never comes due, no timer armed");
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        let handle = self.inner.host.request_timeout(
            Box::new(move || {
                if let Some(scheduler) = Self::upgrade(&weak) {
                    scheduler.handle_timeout();
                }
            }),
            delay_ms.max(0.0),
        );
        trace!(?handle, delay_ms, "armed host timer");
        self.inner.state.lock().timer = Some(handle);
    }

    fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Host timer entry point: promote due tasks and get a slice going.
    fn handle_timeout(&self) {
        let now = self.now();
        let mut state = self.inner.state.lock();
        state.timer = None;
        trace!(now, "host timer fired");
        state.promote_due(now);
        if state.host_callback_pending {
            return;
        }
        if !state.ready.is_empty() {
            state.host_callback_pending = true;
            drop(state);
            self.request_host_callback();
        } else if let Some(next_start) = state.next_start_time() {
            drop(state);
            self.arm_timer(None, next_start - now);
        }
    }

    /// Host callback entry point: run one slice.
    fn perform_work_until_deadline(&self) {
        let now = self.now();
        let (previous_priority, stale_timer) = {
            let mut state = self.inner.state.lock();
            state.host_callback_pending = false;
            state.performing_work = true;
            state.slice_start = now;
            state.needs_paint = false;
            state.counters.slices += 1;
            (state.current_priority, state.timer.take())
        };
        // The drain re-arms a timer on exit if one is still needed.
        if let Some(handle) = stale_timer {
            self.inner.host.cancel_timeout(handle);
        }
        debug!(slice_start = now, "slice started");

        let mut guard = SliceGuard {
            scheduler: self,
            previous_priority,
            has_more_work: true,
        };
        guard.has_more_work = self.work_loop(now);
    }

    /// Drain the ready queue until it is empty or the slice is over. Returns
    /// true when work remains for another slice.
    fn work_loop(&self, initial_time: f64) -> bool {
        let mut current_time = initial_time;
        self.inner.state.lock().promote_due(current_time);

        loop {
            let now = self.now();
            let (task, callback) = {
                let mut state = self.inner.state.lock();
                if state.paused {
                    debug!("slice stopped: scheduler paused");
                    drop(state);
                    self.arm_timer_for_delayed(current_time);
                    return false;
                }
                let Some(head) = state.ready.peek() else {
                    break;
                };
                let task = Arc::clone(&head.item);
                if task.expiration_time > current_time && state.should_yield_at(now) {
                    debug!(
                        elapsed_ms = now - state.slice_start,
                        ready = state.ready.len(),
                        "slice budget spent, yielding to host"
                    );
                    return true;
                }
                let Some(callback) = task.take_callback() else {
                    trace!(task_id = task.id, "discarding cancelled task");
                    state.ready.pop();
                    continue;
                };
                state.current_task = Some(Arc::clone(&task));
                state.current_priority = task.priority;
                (task, callback)
            };

            let did_timeout = task.expiration_time <= current_time;
            trace!(task_id = task.id, did_timeout, "running task");
            let outcome = callback(did_timeout);
            current_time = self.now();

            let mut state = self.inner.state.lock();
            state.current_task = None;
            if let TaskOutcome::Continue(next) = outcome {
                if task.resume_with(next) {
                    state.counters.continued += 1;
                    trace!(task_id = task.id, "task yielded a continuation");
                    state.promote_due(current_time);
                    return true;
                }
                trace!(task_id = task.id, "dropping continuation of cancelled task");
            } else if task.complete() {
                state.counters.completed += 1;
            }
            if state.is_ready_head(&task) {
                state.ready.pop();
            }
            state.promote_due(current_time);
        }

        if !self.inner.state.lock().ready.is_empty() {
            return true;
        }
        self.arm_timer_for_delayed(current_time);
        false
    }

    /// Point the host timer at the earliest delayed task, if there is one.
    fn arm_timer_for_delayed(&self, current_time: f64) {
        let mut state = self.inner.state.lock();
        if let Some(next_start) = state.next_start_time() {
            let stale = state.timer.take();
            drop(state);
            self.arm_timer(stale, next_start - current_time);
        }
    }
}

/// Restores slice bookkeeping on every exit from a slice, including a
/// panicking task body, and re-requests the host while work remains.
struct SliceGuard<'a> {
    scheduler: &'a Scheduler,
    previous_priority: PriorityLevel,
    has_more_work: bool,
}

impl Drop for SliceGuard<'_> {
    fn drop(&mut self) {
        let reschedule = {
            let mut state = self.scheduler.inner.state.lock();
            if let Some(task) = state.current_task.take() {
                if thread::panicking() && task.cancel() {
                    warn!(task_id = task.id, "task body panicked; task abandoned");
                }
            }
            state.current_priority = self.previous_priority;
            state.performing_work = false;
            debug!(has_more_work = self.has_more_work, "slice finished");
            if self.has_more_work && !state.host_callback_pending {
                state.host_callback_pending = true;
                true
            } else {
                false
            }
        };
        if reschedule {
            self.scheduler.request_host_callback();
        }
    }
}

struct PriorityScope<'a> {
    scheduler: &'a Scheduler,
    previous: PriorityLevel,
}

impl Drop for PriorityScope<'_> {
    fn drop(&mut self) {
        self.scheduler.inner.state.lock().current_priority = self.previous;
    }
}
