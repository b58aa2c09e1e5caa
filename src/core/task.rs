//! Task records, bodies, handles, and the id registry.

use std::fmt;
use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::PriorityLevel;

/// Unique task identifier. Assigned in admission order and never reused.
pub type TaskId = u64;

/// A task body. Receives `did_timeout`, true when invoked at or after the
/// task's expiration time.
pub type TaskCallback = Box<dyn FnOnce(bool) -> TaskOutcome + Send + 'static>;

/// What a task body reports back to the scheduler.
pub enum TaskOutcome {
    /// The work is finished.
    Done,
    /// The work is unfinished; run this body in a later slice.
    Continue(TaskCallback),
}

impl TaskOutcome {
    /// Build a [`TaskOutcome::Continue`] from a closure.
    pub fn continue_with<F>(next: F) -> Self
    where
        F: FnOnce(bool) -> Self + Send + 'static,
    {
        Self::Continue(Box::new(next))
    }

    /// True for [`TaskOutcome::Continue`].
    #[must_use]
    pub const fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }
}

impl fmt::Debug for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done => f.write_str("Done"),
            Self::Continue(_) => f.write_str("Continue(..)"),
        }
    }
}

/// Observable lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Queued with a body waiting to run.
    Pending,
    /// Its body is executing right now.
    Running,
    /// The body returned `Done`.
    Completed,
    /// Cancelled, or abandoned by a panicking body. Never invoked again.
    Cancelled,
}

/// Body slot. Anything other than `Pending` is a tombstone as far as the
/// queues are concerned.
enum TaskSlot {
    Pending(TaskCallback),
    Running,
    Completed,
    Cancelled,
}

impl TaskSlot {
    const fn status(&self) -> TaskStatus {
        match self {
            Self::Pending(_) => TaskStatus::Pending,
            Self::Running => TaskStatus::Running,
            Self::Completed => TaskStatus::Completed,
            Self::Cancelled => TaskStatus::Cancelled,
        }
    }
}

/// Internal task record shared between the queues and producer handles.
pub(crate) struct Task {
    pub(crate) id: TaskId,
    pub(crate) priority: PriorityLevel,
    pub(crate) start_time: f64,
    pub(crate) expiration_time: f64,
    slot: Mutex<TaskSlot>,
}

impl Task {
    pub(crate) fn is_tombstone(&self) -> bool {
        !matches!(*self.slot.lock(), TaskSlot::Pending(_))
    }

    pub(crate) fn status(&self) -> TaskStatus {
        self.slot.lock().status()
    }

    /// Move the body out for execution, leaving the task non-invocable.
    pub(crate) fn take_callback(&self) -> Option<TaskCallback> {
        let mut slot = self.slot.lock();
        match mem::replace(&mut *slot, TaskSlot::Running) {
            TaskSlot::Pending(callback) => Some(callback),
            other => {
                *slot = other;
                None
            }
        }
    }

    /// Store a continuation. Returns false, dropping `next`, when the task was
    /// cancelled while its body ran.
    pub(crate) fn resume_with(&self, next: TaskCallback) -> bool {
        let mut slot = self.slot.lock();
        if matches!(*slot, TaskSlot::Running) {
            *slot = TaskSlot::Pending(next);
            true
        } else {
            false
        }
    }

    /// Mark a running task finished. Returns false if it was cancelled while
    /// its body ran.
    pub(crate) fn complete(&self) -> bool {
        let mut slot = self.slot.lock();
        if matches!(*slot, TaskSlot::Running) {
            *slot = TaskSlot::Completed;
            true
        } else {
            false
        }
    }

    /// Tombstone the task. Returns true if this call changed anything.
    pub(crate) fn cancel(&self) -> bool {
        let mut slot = self.slot.lock();
        if matches!(*slot, TaskSlot::Pending(_) | TaskSlot::Running) {
            *slot = TaskSlot::Cancelled;
            true
        } else {
            false
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("start_time", &self.start_time)
            .field("expiration_time", &self.expiration_time)
            .field("status", &self.status())
            .finish()
    }
}

/// Producer-side handle to a scheduled task, used for cancellation and
/// introspection. Cheap to clone.
#[derive(Clone)]
pub struct TaskHandle {
    task: Arc<Task>,
}

impl TaskHandle {
    pub(crate) const fn new(task: Arc<Task>) -> Self {
        Self { task }
    }

    pub(crate) const fn task(&self) -> &Arc<Task> {
        &self.task
    }

    /// Unique, monotonically increasing task id.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.task.id
    }

    /// Priority the task was scheduled with.
    #[must_use]
    pub fn priority(&self) -> PriorityLevel {
        self.task.priority
    }

    /// Absolute time (ms) at which the task becomes eligible.
    #[must_use]
    pub fn start_time(&self) -> f64 {
        self.task.start_time
    }

    /// Absolute deadline (ms) after which the task is overdue.
    #[must_use]
    pub fn expiration_time(&self) -> f64 {
        self.task.expiration_time
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.task.status()
    }

    /// True once the task has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.status() == TaskStatus::Cancelled
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.task.fmt(f)
    }
}

impl PartialEq for TaskHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.task, &other.task)
    }
}

impl Eq for TaskHandle {}

/// Hands out task ids and builds task records.
#[derive(Debug)]
pub(crate) struct TaskRegistry {
    next_id: TaskId,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self { next_id: 1 }
    }
}

impl TaskRegistry {
    pub(crate) fn register(
        &mut self,
        priority: PriorityLevel,
        callback: TaskCallback,
        start_time: f64,
        expiration_time: f64,
    ) -> Arc<Task> {
        let id = self.next_id;
        self.next_id += 1;
        Arc::new(Task {
            id,
            priority,
            start_time,
            expiration_time,
            slot: Mutex::new(TaskSlot::Pending(callback)),
        })
    }
}
