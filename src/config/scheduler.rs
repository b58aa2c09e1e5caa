//! Scheduler configuration: frame budget and per-priority timeouts.

use serde::{Deserialize, Serialize};

use crate::core::{PriorityLevel, SchedulerError};

/// Default slice budget in milliseconds.
pub const DEFAULT_FRAME_BUDGET_MS: f64 = 5.0;

/// Largest 31-bit signed integer; used as the "never expires" idle timeout.
pub const MAX_SIGNED_31_BIT_INT: f64 = 1_073_741_823.0;

/// Environment variable names read by [`SchedulerConfig::from_env`].
pub mod env {
    /// Slice budget in milliseconds.
    pub const FRAME_BUDGET_MS: &str = "SCHEDULER_FRAME_BUDGET_MS";
    /// Immediate timeout in milliseconds.
    pub const IMMEDIATE_TIMEOUT_MS: &str = "SCHEDULER_IMMEDIATE_TIMEOUT_MS";
    /// User-blocking timeout in milliseconds.
    pub const USER_BLOCKING_TIMEOUT_MS: &str = "SCHEDULER_USER_BLOCKING_TIMEOUT_MS";
    /// Normal timeout in milliseconds.
    pub const NORMAL_TIMEOUT_MS: &str = "SCHEDULER_NORMAL_TIMEOUT_MS";
    /// Low timeout in milliseconds.
    pub const LOW_TIMEOUT_MS: &str = "SCHEDULER_LOW_TIMEOUT_MS";
    /// Idle timeout in milliseconds.
    pub const IDLE_TIMEOUT_MS: &str = "SCHEDULER_IDLE_TIMEOUT_MS";
}

/// Timeout added to a task's start time to form its expiration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityTimeouts {
    /// Immediate priority; must be `<= 0` so the task is expired on admission.
    pub immediate_ms: f64,
    /// User-blocking priority.
    pub user_blocking_ms: f64,
    /// Normal priority, also the fallback for unrecognized levels.
    pub normal_ms: f64,
    /// Low priority.
    pub low_ms: f64,
    /// Idle priority.
    pub idle_ms: f64,
}

impl Default for PriorityTimeouts {
    fn default() -> Self {
        Self {
            immediate_ms: -1.0,
            user_blocking_ms: 250.0,
            normal_ms: 5000.0,
            low_ms: 10_000.0,
            idle_ms: MAX_SIGNED_31_BIT_INT,
        }
    }
}

impl PriorityTimeouts {
    /// Timeout for `priority`; anything without its own entry uses `normal_ms`.
    #[must_use]
    pub const fn timeout_for(&self, priority: PriorityLevel) -> f64 {
        match priority {
            PriorityLevel::Immediate => self.immediate_ms,
            PriorityLevel::UserBlocking => self.user_blocking_ms,
            PriorityLevel::Low => self.low_ms,
            PriorityLevel::Idle => self.idle_ms,
            PriorityLevel::Normal | PriorityLevel::NoPriority => self.normal_ms,
        }
    }

    /// Validate finiteness and the ordering immediate < user-blocking < normal < low < idle.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        let ladder = [
            ("immediate_ms", self.immediate_ms),
            ("user_blocking_ms", self.user_blocking_ms),
            ("normal_ms", self.normal_ms),
            ("low_ms", self.low_ms),
            ("idle_ms", self.idle_ms),
        ];
        for (name, value) in ladder {
            if !value.is_finite() {
                return Err(format!("{name} must be finite"));
            }
        }
        if self.immediate_ms > 0.0 {
            return Err("immediate_ms must be <= 0".into());
        }
        for pair in ladder.windows(2) {
            let (lower_name, lower) = pair[0];
            let (upper_name, upper) = pair[1];
            if lower >= upper {
                return Err(format!("{lower_name} must be less than {upper_name}"));
            }
        }
        Ok(())
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Time budget of one slice, in milliseconds.
    pub frame_budget_ms: f64,
    /// Per-priority timeouts.
    pub timeouts: PriorityTimeouts,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frame_budget_ms: DEFAULT_FRAME_BUDGET_MS,
            timeouts: PriorityTimeouts::default(),
        }
    }
}

impl SchedulerConfig {
    /// Set the slice budget.
    #[must_use]
    pub const fn with_frame_budget_ms(mut self, frame_budget_ms: f64) -> Self {
        self.frame_budget_ms = frame_budget_ms;
        self
    }

    /// Replace the timeout table.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: PriorityTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Validate the budget and timeout table.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        if !self.frame_budget_ms.is_finite() || self.frame_budget_ms <= 0.0 {
            return Err("frame_budget_ms must be a positive number".into());
        }
        self.timeouts
            .validate()
            .map_err(|e| format!("timeouts invalid: {e}"))
    }

    /// Parse scheduler configuration from a JSON string and validate.
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::ConfigParse`] for malformed JSON,
    /// [`SchedulerError::InvalidConfig`] when validation fails.
    pub fn from_json_str(input: &str) -> Result<Self, SchedulerError> {
        let cfg: Self =
            serde_json::from_str(input).map_err(|e| SchedulerError::ConfigParse(e.to_string()))?;
        cfg.validate().map_err(SchedulerError::InvalidConfig)?;
        Ok(cfg)
    }

    /// Load configuration from `SCHEDULER_*` environment variables, reading a
    /// `.env` file first when one is present. Unset variables keep defaults.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::ConfigParse`] for non-numeric values,
    /// [`SchedulerError::InvalidConfig`] when validation fails.
    pub fn from_env() -> Result<Self, SchedulerError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(SchedulerError::ConfigParse(format!(".env: {e}")));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup using the
    /// [`env`] variable names.
    ///
    /// # Errors
    ///
    /// Same as [`SchedulerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SchedulerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str, slot: &mut f64| -> Result<(), SchedulerError> {
            if let Some(raw) = lookup(key) {
                *slot = raw
                    .trim()
                    .parse()
                    .map_err(|e| SchedulerError::ConfigParse(format!("{key}={raw:?}: {e}")))?;
            }
            Ok(())
        };

        let mut cfg = Self::default();
        read(env::FRAME_BUDGET_MS, &mut cfg.frame_budget_ms)?;
        read(env::IMMEDIATE_TIMEOUT_MS, &mut cfg.timeouts.immediate_ms)?;
        read(env::USER_BLOCKING_TIMEOUT_MS, &mut cfg.timeouts.user_blocking_ms)?;
        read(env::NORMAL_TIMEOUT_MS, &mut cfg.timeouts.normal_ms)?;
        read(env::LOW_TIMEOUT_MS, &mut cfg.timeouts.low_ms)?;
        read(env::IDLE_TIMEOUT_MS, &mut cfg.timeouts.idle_ms)?;
        cfg.validate().map_err(SchedulerError::InvalidConfig)?;
        Ok(cfg)
    }
}
