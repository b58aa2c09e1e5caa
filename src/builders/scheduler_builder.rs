//! Build a scheduler from configuration.

use crate::config::SchedulerConfig;
use crate::core::{Clock, HostBridge, Scheduler, SchedulerError};

/// Validate `cfg` and construct a scheduler around the given clock and host.
///
/// # Errors
///
/// [`SchedulerError::InvalidConfig`] when the configuration fails validation.
pub fn build_scheduler<C, H>(
    cfg: &SchedulerConfig,
    clock: C,
    host: H,
) -> Result<Scheduler, SchedulerError>
where
    C: Clock + 'static,
    H: HostBridge + 'static,
{
    cfg.validate()
        .map_err(|e| SchedulerError::InvalidConfig(format!("config invalid: {e}")))?;
    tracing::debug!(frame_budget_ms = cfg.frame_budget_ms, "building scheduler");
    Ok(Scheduler::new(cfg.clone(), clock, host))
}

/// Load configuration from the environment (and `.env`) and build a scheduler.
///
/// # Errors
///
/// Propagates [`SchedulerConfig::from_env`] failures.
pub fn build_scheduler_from_env<C, H>(clock: C, host: H) -> Result<Scheduler, SchedulerError>
where
    C: Clock + 'static,
    H: HostBridge + 'static,
{
    let cfg = SchedulerConfig::from_env()?;
    build_scheduler(&cfg, clock, host)
}
