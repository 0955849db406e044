use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// On-disk run configuration (TOML or JSON).
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub threads: u64,
    pub iterations: u64,
    pub ramp_up: Option<DurationValue>,
    pub hold: Option<DurationValue>,
    pub duration: Option<DurationValue>,
    pub pacing: Option<DurationValue>,
    pub success_threshold: Option<f64>,
    pub drain_timeout: Option<DurationValue>,
    pub max_duration: Option<DurationValue>,
    pub progress_interval: Option<DurationValue>,
    pub result_log: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    pub http: Option<HttpConfig>,
    pub simulated: Option<SimulatedConfig>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HttpConfig {
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub user_agent: Option<String>,
    pub insecure: Option<bool>,
    pub follow_redirects: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SimulatedConfig {
    pub min_latency_ms: Option<u64>,
    pub max_latency_ms: Option<u64>,
    pub failure_percent: Option<u8>,
    pub status_code: Option<u16>,
    pub response_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub threads: Option<u64>,
    pub iterations: Option<u64>,
    pub ramp_up: Option<DurationValue>,
    pub hold: Option<DurationValue>,
    pub duration: Option<DurationValue>,
    pub pacing: Option<DurationValue>,
    pub success_threshold: Option<f64>,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    pub data_source: Option<DataSourceConfig>,
    #[serde(default)]
    pub requests: Vec<RequestConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DataSourceConfig {
    pub path: PathBuf,
    pub required: Option<bool>,
    pub delimiter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestConfig {
    pub name: String,
    pub protocol: Option<String>,
    pub endpoint: String,
    pub method: Option<String>,
    pub body: Option<String>,
    pub body_file: Option<PathBuf>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

/// A duration given either as whole seconds or as text with a unit
/// (`"250ms"`, `"10s"`, `"5m"`, `"1h"`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}
