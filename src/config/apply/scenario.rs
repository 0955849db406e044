use std::path::Path;

use crate::data::parse_delimiter;
use crate::domain::{DataSourceRef, LogicalRequest, PlanOverrides, ProtocolKind, Scenario};
use crate::error::{AppError, AppResult, ConfigError};

use crate::config::loader::LoadedConfig;
use crate::config::parse::{optional_duration, positive_duration};
use crate::config::types::{DataSourceConfig, RequestConfig, ScenarioConfig};

pub(super) fn build_scenario(loaded: &LoadedConfig, config: &ScenarioConfig) -> AppResult<Scenario> {
    let requests = config
        .requests
        .iter()
        .map(|request| build_request(loaded, request))
        .collect::<AppResult<Vec<_>>>()?;
    let data_source = config
        .data_source
        .as_ref()
        .map(|source| data_source(loaded, source))
        .transpose()?;
    Ok(Scenario::new(&config.name, requests)
        .with_variables(config.variables.clone())
        .with_data_source(data_source)
        .with_overrides(overrides(config)?))
}

fn overrides(config: &ScenarioConfig) -> Result<PlanOverrides, ConfigError> {
    Ok(PlanOverrides {
        threads: config.threads,
        iterations: config.iterations,
        ramp_up: optional_duration(config.ramp_up.as_ref())?,
        hold: optional_duration(config.hold.as_ref())?,
        duration: positive_duration(config.duration.as_ref(), "scenarios.duration")?,
        pacing: optional_duration(config.pacing.as_ref())?,
        success_threshold_percent: config.success_threshold,
    })
}

fn data_source(loaded: &LoadedConfig, config: &DataSourceConfig) -> AppResult<DataSourceRef> {
    let delimiter = match config.delimiter.as_deref() {
        Some(value) => parse_delimiter(value)?,
        None => b',',
    };
    Ok(DataSourceRef::new(
        loaded.resolve_path(&config.path),
        config.required.unwrap_or(true),
        delimiter,
    ))
}

fn build_request(loaded: &LoadedConfig, config: &RequestConfig) -> AppResult<LogicalRequest> {
    let protocol = match config.protocol.as_deref() {
        Some(value) => value.parse::<ProtocolKind>()?,
        None => ProtocolKind::Http,
    };
    let body = match (config.body.as_ref(), config.body_file.as_deref()) {
        (Some(_), Some(_)) => {
            return Err(AppError::config(ConfigError::BodyConflict {
                request: config.name.clone(),
            }));
        }
        (Some(body), None) => Some(body.clone()),
        (None, Some(path)) => Some(read_body_file(&loaded.resolve_path(path))?),
        (None, None) => None,
    };
    let mut request = LogicalRequest::new(&config.name, protocol, &config.endpoint)
        .with_body(body)
        .with_headers(config.headers.clone())
        .with_params(config.params.clone())
        .with_variables(config.variables.clone());
    if let Some(method) = config.method.as_deref() {
        request = request.with_method(method);
    }
    Ok(request)
}

fn read_body_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|err| ConfigError::ReadBodyFile {
        path: path.to_path_buf(),
        source: err,
    })
}
