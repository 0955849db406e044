use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have .toml or .json extension.")]
    MissingExtension,
    #[error("No config given and no loadsmith.toml or loadsmith.json found.")]
    NoConfigFound,
    #[error("Failed to read body file '{path}': {source}")]
    ReadBodyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Request '{request}' cannot set both 'body' and 'body_file'.")]
    BodyConflict { request: String },
    #[error("'threads' must be > 0 (got {value}).")]
    ThreadsMustBePositive { value: u64 },
    #[error("'success_threshold' must be within [0, 100] (got {value}).")]
    ThresholdOutOfRange { value: f64 },
    #[error("'iterations' is 0 but no 'duration' was given for a duration-based run.")]
    DurationRequired,
    #[error("Configuration must define at least one scenario.")]
    NoScenarios,
    #[error("Scenario '{scenario}' must define at least one request.")]
    ScenarioWithoutRequests { scenario: String },
    #[error("Duplicate scenario name '{name}'.")]
    DuplicateScenario { name: String },
    #[error("Unknown protocol '{value}'. Use http, graphql, soap, or simulated.")]
    UnknownProtocol { value: String },
    #[error("No protocol adapter registered for '{protocol}' (request '{request}').")]
    UnsupportedProtocol { protocol: String, request: String },
    #[error("Malformed variable reference in {field} of '{owner}': unterminated '${{' in '{value}'.")]
    MalformedVariableReference {
        owner: String,
        field: String,
        value: String,
    },
    #[error("Invalid variable override '{value}'. Expected 'name=value'.")]
    InvalidVariableOverride { value: String },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("'{field}' must be > 0.")]
    DurationZero { field: &'static str },
    #[error("Simulated latency range is inverted ({min} > {max}).")]
    SimulatedLatencyRange { min: u64, max: u64 },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
