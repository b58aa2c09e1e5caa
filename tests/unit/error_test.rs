//! Tests for error types

use prometheus_task_scheduler::core::SchedulerError;

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("frame_budget_ms must be a positive number".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: frame_budget_ms must be a positive number"
    );
}

#[test]
fn test_config_parse_error() {
    let err = SchedulerError::ConfigParse("expected value".to_string());
    assert_eq!(format!("{}", err), "config parse error: expected value");
}

#[test]
fn test_invalid_frame_rate_error() {
    let err = SchedulerError::InvalidFrameRate(240);
    assert_eq!(format!("{}", err), "invalid frame rate 240: expected 0..=125 fps");
}

#[test]
fn test_host_error() {
    let err = SchedulerError::Host("no reactor running".to_string());
    assert_eq!(format!("{}", err), "host error: no reactor running");
}

#[test]
fn test_app_result_wraps_scheduler_error() {
    fn load() -> prometheus_task_scheduler::core::AppResult<()> {
        let rejected: Result<(), SchedulerError> = Err(SchedulerError::InvalidFrameRate(500));
        rejected?;
        Ok(())
    }
    let err = load().unwrap_err();
    assert!(err.to_string().contains("500"));
}
