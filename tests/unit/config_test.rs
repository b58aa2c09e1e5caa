//! Tests for configuration validation

use std::collections::HashMap;

use prometheus_task_scheduler::config::{PriorityTimeouts, SchedulerConfig};
use prometheus_task_scheduler::core::{PriorityLevel, SchedulerError};

#[test]
fn test_default_config_is_valid() {
    let config = SchedulerConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.frame_budget_ms, 5.0);
}

#[test]
fn test_invalid_frame_budget() {
    for budget in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let config = SchedulerConfig::default().with_frame_budget_ms(budget);
        assert!(config.validate().is_err(), "budget {budget} should be rejected");
    }
}

#[test]
fn test_immediate_timeout_must_not_be_positive() {
    let timeouts = PriorityTimeouts {
        immediate_ms: 1.0,
        ..PriorityTimeouts::default()
    };
    assert!(timeouts.validate().is_err());
}

#[test]
fn test_timeouts_must_be_ordered() {
    let timeouts = PriorityTimeouts {
        normal_ms: 20_000.0,
        ..PriorityTimeouts::default()
    };
    let err = timeouts.validate().unwrap_err();
    assert!(err.contains("normal_ms"));

    let config = SchedulerConfig::default().with_timeouts(timeouts);
    assert!(config.validate().is_err());
}

#[test]
fn test_timeout_table_lookup() {
    let timeouts = PriorityTimeouts::default();
    assert!(timeouts.timeout_for(PriorityLevel::Immediate) <= 0.0);
    assert_eq!(timeouts.timeout_for(PriorityLevel::UserBlocking), 250.0);
    assert_eq!(timeouts.timeout_for(PriorityLevel::Normal), 5000.0);
    assert_eq!(timeouts.timeout_for(PriorityLevel::Low), 10_000.0);
    assert_eq!(timeouts.timeout_for(PriorityLevel::Idle), 1_073_741_823.0);
}

#[test]
fn test_unrecognized_priority_uses_normal_timeout() {
    let timeouts = PriorityTimeouts::default();
    assert_eq!(
        timeouts.timeout_for(PriorityLevel::NoPriority),
        timeouts.timeout_for(PriorityLevel::Normal)
    );
    assert_eq!(
        timeouts.timeout_for(PriorityLevel::from_raw(99)),
        timeouts.timeout_for(PriorityLevel::Normal)
    );
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "frame_budget_ms": 8,
        "timeouts": {
            "immediate_ms": -1,
            "user_blocking_ms": 100,
            "normal_ms": 2000,
            "low_ms": 8000,
            "idle_ms": 100000
        }
    }"#;

    let config = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(config.frame_budget_ms, 8.0);
    assert_eq!(config.timeouts.user_blocking_ms, 100.0);
}

#[test]
fn test_scheduler_config_from_partial_json() {
    let config = SchedulerConfig::from_json_str(r#"{ "frame_budget_ms": 12 }"#).unwrap();
    assert_eq!(config.frame_budget_ms, 12.0);
    assert_eq!(config.timeouts, PriorityTimeouts::default());
}

#[test]
fn test_scheduler_config_from_bad_json() {
    let result = SchedulerConfig::from_json_str("{ frame_budget_ms: }");
    assert!(matches!(result, Err(SchedulerError::ConfigParse(_))));

    let result = SchedulerConfig::from_json_str(r#"{ "frame_budget_ms": -3 }"#);
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}

#[test]
fn test_scheduler_config_from_lookup() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("SCHEDULER_FRAME_BUDGET_MS", "10"),
        ("SCHEDULER_LOW_TIMEOUT_MS", " 20000 "),
    ]);

    let config = SchedulerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
    assert_eq!(config.frame_budget_ms, 10.0);
    assert_eq!(config.timeouts.low_ms, 20_000.0);
    assert_eq!(config.timeouts.normal_ms, 5000.0);
}

#[test]
fn test_scheduler_config_from_lookup_rejects_garbage() {
    let result = SchedulerConfig::from_lookup(|key| {
        (key == "SCHEDULER_NORMAL_TIMEOUT_MS").then(|| "soon".to_string())
    });
    assert!(matches!(result, Err(SchedulerError::ConfigParse(_))));
}

#[test]
fn test_scheduler_config_from_empty_lookup_is_default() {
    let config = SchedulerConfig::from_lookup(|_| None).unwrap();
    assert_eq!(config, SchedulerConfig::default());
}
