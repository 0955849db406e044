use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

use super::PlanOverrides;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    Http,
    Graphql,
    Soap,
    Simulated,
}

impl ProtocolKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ProtocolKind::Http => "http",
            ProtocolKind::Graphql => "graphql",
            ProtocolKind::Soap => "soap",
            ProtocolKind::Simulated => "simulated",
        }
    }

    /// Method used when a request does not name one.
    #[must_use]
    pub const fn default_method(self) -> &'static str {
        match self {
            ProtocolKind::Http | ProtocolKind::Simulated => "GET",
            ProtocolKind::Graphql | ProtocolKind::Soap => "POST",
        }
    }
}

impl FromStr for ProtocolKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" | "https" => Ok(ProtocolKind::Http),
            "graphql" => Ok(ProtocolKind::Graphql),
            "soap" => Ok(ProtocolKind::Soap),
            "simulated" => Ok(ProtocolKind::Simulated),
            _ => Err(ConfigError::UnknownProtocol {
                value: value.to_owned(),
            }),
        }
    }
}

/// One request template inside a scenario. Fields may contain `${...}`
/// placeholders that are resolved per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalRequest {
    name: String,
    protocol: ProtocolKind,
    endpoint: String,
    method: String,
    body: Option<String>,
    headers: BTreeMap<String, String>,
    params: BTreeMap<String, String>,
    variables: BTreeMap<String, String>,
}

impl LogicalRequest {
    #[must_use]
    pub fn new(name: &str, protocol: ProtocolKind, endpoint: &str) -> Self {
        Self {
            name: name.to_owned(),
            protocol,
            endpoint: endpoint.to_owned(),
            method: protocol.default_method().to_owned(),
            body: None,
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            variables: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.trim().to_ascii_uppercase();
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    #[must_use]
    pub fn with_variable(mut self, name: &str, value: &str) -> Self {
        self.variables.insert(name.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn protocol(&self) -> ProtocolKind {
        self.protocol
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    #[must_use]
    pub const fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    #[must_use]
    pub const fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    /// Every templated field with a label, for configuration-time checks.
    pub(crate) fn template_fields(&self) -> Vec<(String, &str)> {
        let mut fields = vec![
            ("endpoint".to_owned(), self.endpoint.as_str()),
            ("method".to_owned(), self.method.as_str()),
        ];
        if let Some(body) = self.body.as_deref() {
            fields.push(("body".to_owned(), body));
        }
        for (key, value) in &self.headers {
            fields.push((format!("header '{}'", key), value.as_str()));
        }
        for (key, value) in &self.params {
            fields.push((format!("param '{}'", key), value.as_str()));
        }
        for (key, value) in &self.variables {
            fields.push((format!("variable '{}'", key), value.as_str()));
        }
        fields
    }
}

/// Reference to a tabular data file that drives per-iteration variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceRef {
    path: PathBuf,
    required: bool,
    delimiter: u8,
}

impl DataSourceRef {
    #[must_use]
    pub const fn new(path: PathBuf, required: bool, delimiter: u8) -> Self {
        Self {
            path,
            required,
            delimiter,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub const fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

/// Named, ordered list of requests executed once per iteration.
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    requests: Vec<LogicalRequest>,
    variables: BTreeMap<String, String>,
    data_source: Option<DataSourceRef>,
    overrides: PlanOverrides,
}

impl Scenario {
    #[must_use]
    pub fn new(name: &str, requests: Vec<LogicalRequest>) -> Self {
        Self {
            name: name.to_owned(),
            requests,
            variables: BTreeMap::new(),
            data_source: None,
            overrides: PlanOverrides::default(),
        }
    }

    #[must_use]
    pub fn with_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    #[must_use]
    pub fn with_data_source(mut self, data_source: Option<DataSourceRef>) -> Self {
        self.data_source = data_source;
        self
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: PlanOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn requests(&self) -> &[LogicalRequest] {
        &self.requests
    }

    #[must_use]
    pub const fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    #[must_use]
    pub const fn data_source(&self) -> Option<&DataSourceRef> {
        self.data_source.as_ref()
    }

    #[must_use]
    pub const fn overrides(&self) -> &PlanOverrides {
        &self.overrides
    }
}
