//! Priority levels understood by the scheduler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Priority of a scheduled task.
///
/// Levels carry no numeric rank of their own: ordering between tasks comes
/// entirely from the expiration time derived from each level's configured
/// timeout (see [`crate::config::PriorityTimeouts`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    /// Sentinel reported while no task is executing.
    #[default]
    NoPriority,
    /// Already expired on admission; runs ahead of everything else.
    Immediate,
    /// Work the user is actively waiting on.
    UserBlocking,
    /// Default priority.
    Normal,
    /// Work that can be deferred for a while.
    Low,
    /// Work that only runs when nothing else wants the host.
    Idle,
}

impl PriorityLevel {
    /// Map a raw numeric level onto a priority.
    ///
    /// `0` is [`PriorityLevel::NoPriority`], `1..=5` map to `Immediate` through
    /// `Idle`, and anything unrecognized falls back to `Normal`.
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        match raw {
            0 => Self::NoPriority,
            1 => Self::Immediate,
            2 => Self::UserBlocking,
            3 => Self::Normal,
            4 => Self::Low,
            5 => Self::Idle,
            _ => Self::Normal,
        }
    }

    /// Raw numeric level, the inverse of [`PriorityLevel::from_raw`].
    #[must_use]
    pub const fn as_raw(self) -> i64 {
        match self {
            Self::NoPriority => 0,
            Self::Immediate => 1,
            Self::UserBlocking => 2,
            Self::Normal => 3,
            Self::Low => 4,
            Self::Idle => 5,
        }
    }

    /// Stable lowercase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoPriority => "no_priority",
            Self::Immediate => "immediate",
            Self::UserBlocking => "user_blocking",
            Self::Normal => "normal",
            Self::Low => "low",
            Self::Idle => "idle",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
