//! Turns a parsed [`ConfigFile`] into the immutable run model.
mod scenario;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{ExecutionPlan, Scenario};
use crate::error::{AppResult, ConfigError};
use crate::protocol::{HttpSettings, SimulatedSettings};

use super::loader::LoadedConfig;
use super::parse::{optional_duration, positive_duration};
use super::types::{ConfigFile, HttpConfig, SimulatedConfig};

/// Everything `run` needs, resolved from one configuration file.
#[derive(Debug)]
pub struct RunSettings {
    pub plan: ExecutionPlan,
    pub scenarios: Vec<Scenario>,
    pub http: HttpSettings,
    pub simulated: Option<SimulatedSettings>,
    pub result_log: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
}

/// Validates `loaded` and builds the run model. `variable_overrides` replace
/// (or add) global variables.
///
/// # Errors
///
/// Returns an error when a value is out of range, a duration does not
/// parse, a request is inconsistent, or a body file cannot be read.
pub fn apply_config(
    loaded: &LoadedConfig,
    variable_overrides: &BTreeMap<String, String>,
) -> AppResult<RunSettings> {
    let file = &loaded.file;
    let plan = build_plan(file, variable_overrides)?;
    let scenarios = file
        .scenarios
        .iter()
        .map(|config| scenario::build_scenario(loaded, config))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(RunSettings {
        plan,
        scenarios,
        http: http_settings(file.http.as_ref())?,
        simulated: file.simulated.as_ref().map(simulated_settings).transpose()?,
        result_log: file.result_log.as_ref().map(|path| loaded.resolve_path(path)),
        summary_json: file
            .summary_json
            .as_ref()
            .map(|path| loaded.resolve_path(path)),
    })
}

fn build_plan(
    file: &ConfigFile,
    variable_overrides: &BTreeMap<String, String>,
) -> Result<ExecutionPlan, ConfigError> {
    let mut variables = file.variables.clone();
    variables.extend(
        variable_overrides
            .iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    );

    let mut builder = ExecutionPlan::builder(file.threads, file.iterations)
        .duration(positive_duration(file.duration.as_ref(), "duration")?)
        .max_duration(positive_duration(
            file.max_duration.as_ref(),
            "max_duration",
        )?)
        .global_variables(variables);
    if let Some(ramp_up) = optional_duration(file.ramp_up.as_ref())? {
        builder = builder.ramp_up(ramp_up);
    }
    if let Some(hold) = optional_duration(file.hold.as_ref())? {
        builder = builder.hold(hold);
    }
    if let Some(pacing) = optional_duration(file.pacing.as_ref())? {
        builder = builder.pacing(pacing);
    }
    if let Some(threshold) = file.success_threshold {
        builder = builder.success_threshold_percent(threshold);
    }
    if let Some(drain_timeout) = optional_duration(file.drain_timeout.as_ref())? {
        builder = builder.drain_timeout(drain_timeout);
    }
    if let Some(interval) =
        positive_duration(file.progress_interval.as_ref(), "progress_interval")?
    {
        builder = builder.progress_interval(interval);
    }
    builder.build()
}

fn http_settings(config: Option<&HttpConfig>) -> Result<HttpSettings, ConfigError> {
    let mut settings = HttpSettings::default();
    let Some(config) = config else {
        return Ok(settings);
    };
    if let Some(timeout) = positive_duration(config.timeout.as_ref(), "http.timeout")? {
        settings.timeout = timeout;
    }
    if let Some(timeout) =
        positive_duration(config.connect_timeout.as_ref(), "http.connect_timeout")?
    {
        settings.connect_timeout = timeout;
    }
    if let Some(user_agent) = config.user_agent.as_ref() {
        settings.user_agent.clone_from(user_agent);
    }
    if let Some(insecure) = config.insecure {
        settings.insecure = insecure;
    }
    if let Some(follow) = config.follow_redirects {
        settings.follow_redirects = follow;
    }
    Ok(settings)
}

fn simulated_settings(config: &SimulatedConfig) -> Result<SimulatedSettings, ConfigError> {
    let min = config.min_latency_ms.unwrap_or(0);
    let max = config.max_latency_ms.unwrap_or(min);
    let mut settings =
        SimulatedSettings::new(Duration::from_millis(min), Duration::from_millis(max))?;
    if let Some(percent) = config.failure_percent {
        settings = settings.with_failure_percent(percent);
    }
    if let Some(status_code) = config.status_code {
        settings = settings.with_status_code(status_code);
    }
    if let Some(bytes) = config.response_bytes {
        settings = settings.with_response_bytes(bytes);
    }
    Ok(settings)
}
