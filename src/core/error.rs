//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced by scheduler components.
///
/// Admission and cancellation never fail; these cover the configuration and
/// host-integration edges around the scheduling core.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration values failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Configuration input could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Requested frame rate is outside the supported range.
    #[error("invalid frame rate {0}: expected 0..=125 fps")]
    InvalidFrameRate(u32),
    /// Host adapter failure with context.
    #[error("host error: {0}")]
    Host(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
