use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use url::{Url, form_urlencoded};

use crate::domain::ProtocolKind;
use crate::error::ProtocolError;

/// A fully resolved request handed to a port. No placeholders remain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolRequest {
    pub endpoint: String,
    pub method: String,
    pub body: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub variables: BTreeMap<String, String>,
}

impl ProtocolRequest {
    #[must_use]
    pub fn sent_bytes(&self) -> u64 {
        self.body
            .as_ref()
            .map_or(0, |body| u64::try_from(body.len()).unwrap_or(u64::MAX))
    }

    /// The endpoint with `params` appended as a query string, i.e. the URL
    /// that goes on the wire.
    #[must_use]
    pub fn url(&self) -> String {
        if self.params.is_empty() {
            return self.endpoint.clone();
        }
        Url::parse(&self.endpoint).map_or_else(
            |_err| {
                let query = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(self.params.iter())
                    .finish();
                let separator = if self.endpoint.contains('?') { '&' } else { '?' };
                format!("{}{}{}", self.endpoint, separator, query)
            },
            |mut url| {
                url.query_pairs_mut().extend_pairs(self.params.iter());
                url.into()
            },
        )
    }
}

/// What a port observed for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolResponse {
    pub success: bool,
    /// Protocol status or result code; 0 when nothing was received.
    pub status_code: u16,
    pub message: String,
    pub body: Vec<u8>,
    pub elapsed: Duration,
    /// Time until the response head arrived.
    pub latency: Duration,
    pub headers: BTreeMap<String, String>,
}

impl ProtocolResponse {
    /// A call that produced no response at all (refused, reset, timed out).
    #[must_use]
    pub fn no_response(message: String, elapsed: Duration) -> Self {
        Self {
            success: false,
            status_code: 0,
            message,
            body: Vec::new(),
            elapsed,
            latency: elapsed,
            headers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn bytes(&self) -> u64 {
        u64::try_from(self.body.len()).unwrap_or(u64::MAX)
    }
}

/// Executes one logical request against one protocol.
///
/// Ports own their timeout policy and must not block indefinitely. Ordinary
/// failures come back as an unsuccessful [`ProtocolResponse`]; `Err` is for
/// mistakes in the request itself.
#[async_trait]
pub trait ProtocolPort: Send + Sync {
    fn protocol(&self) -> ProtocolKind;

    /// Executes `request` once.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be built, e.g. a malformed
    /// endpoint or method.
    async fn execute(&self, request: &ProtocolRequest) -> Result<ProtocolResponse, ProtocolError>;
}
