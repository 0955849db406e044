use std::time::Duration;

use super::*;
use crate::error::{AppError, AppResult, ConfigError};

#[test]
fn builder_rejects_zero_threads() -> AppResult<()> {
    match ExecutionPlan::builder(0, 1).build() {
        Err(ConfigError::ThreadsMustBePositive { value: 0 }) => Ok(()),
        other => Err(AppError::config(format!(
            "Expected ThreadsMustBePositive, got {:?}",
            other
        ))),
    }
}

#[test]
fn builder_rejects_threshold_outside_percent_range() -> AppResult<()> {
    for threshold in [-0.5, 100.5, f64::NAN] {
        let result = ExecutionPlan::builder(1, 1)
            .success_threshold_percent(threshold)
            .build();
        if !matches!(result, Err(ConfigError::ThresholdOutOfRange { .. })) {
            return Err(AppError::config(format!(
                "Threshold {} should be rejected, got {:?}",
                threshold, result
            )));
        }
    }
    Ok(())
}

#[test]
fn zero_iterations_requires_duration() -> AppResult<()> {
    if !matches!(
        ExecutionPlan::builder(1, 0).build(),
        Err(ConfigError::DurationRequired)
    ) {
        return Err(AppError::config("Expected DurationRequired"));
    }
    let plan = ExecutionPlan::builder(1, 0)
        .duration(Some(Duration::from_secs(3)))
        .build()?;
    if plan.stop_condition() != StopCondition::Elapsed(Duration::from_secs(3)) {
        return Err(AppError::config("Expected duration-based stop condition"));
    }
    Ok(())
}

#[test]
fn defaults_match_documented_values() -> AppResult<()> {
    let plan = ExecutionPlan::builder(2, 3).build()?;
    if plan.ramp_up() != Duration::ZERO || plan.hold() != Duration::ZERO {
        return Err(AppError::config("Ramp-up and hold default to zero"));
    }
    if plan.success_threshold_percent() < DEFAULT_SUCCESS_THRESHOLD {
        return Err(AppError::config("Threshold defaults to 100"));
    }
    if !plan.global_variables().is_empty() {
        return Err(AppError::config("Variables default to empty"));
    }
    if plan.stop_condition() != StopCondition::Iterations(3) {
        return Err(AppError::config("Expected count-based stop condition"));
    }
    Ok(())
}

#[test]
fn overrides_replace_only_given_fields() -> AppResult<()> {
    let plan = ExecutionPlan::builder(4, 10)
        .ramp_up(Duration::from_secs(8))
        .global_variable("host", "example.test")
        .build()?;
    let overrides = PlanOverrides {
        threads: Some(2),
        success_threshold_percent: Some(80.0),
        ..PlanOverrides::default()
    };
    let merged = plan.with_overrides(&overrides)?;
    if merged.threads() != 2 || merged.iterations() != 10 {
        return Err(AppError::config(format!(
            "Unexpected threads/iterations {}/{}",
            merged.threads(),
            merged.iterations()
        )));
    }
    if merged.ramp_up() != Duration::from_secs(8) {
        return Err(AppError::config("Ramp-up should be inherited"));
    }
    if merged.global_variables().get("host").map(String::as_str) != Some("example.test") {
        return Err(AppError::config("Globals should be inherited"));
    }
    Ok(())
}

#[test]
fn implied_deadline_covers_duration_based_runs() -> AppResult<()> {
    let plan = ExecutionPlan::builder(1, 0)
        .ramp_up(Duration::from_secs(2))
        .duration(Some(Duration::from_secs(5)))
        .hold(Duration::from_secs(1))
        .build()?;
    if plan.implied_deadline() != Some(Duration::from_secs(8)) {
        return Err(AppError::config(format!(
            "Unexpected deadline {:?}",
            plan.implied_deadline()
        )));
    }
    let counted = ExecutionPlan::builder(1, 5).build()?;
    if counted.implied_deadline().is_some() {
        return Err(AppError::config("Count-based plans have no implied deadline"));
    }
    Ok(())
}

#[test]
fn failed_record_falls_back_to_response_message() {
    let record = ResultRecord::builder("checkout", "login")
        .status_code(503)
        .response_message("Service Unavailable")
        .build();
    assert_eq!(record.error_message(), Some("Service Unavailable"));
    assert!(!record.success());

    let ok = ResultRecord::builder("checkout", "login")
        .success(true)
        .response_message("OK")
        .build();
    assert_eq!(ok.error_message(), None);
}

#[test]
fn protocol_kind_parses_case_insensitively() -> AppResult<()> {
    let parsed: ProtocolKind = "GraphQL".parse()?;
    if parsed != ProtocolKind::Graphql {
        return Err(AppError::config("Expected graphql"));
    }
    if "jdbc".parse::<ProtocolKind>().is_ok() {
        return Err(AppError::config("jdbc has no adapter and must be rejected"));
    }
    Ok(())
}
