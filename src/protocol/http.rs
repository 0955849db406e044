use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, Url, redirect};
use tokio::time::Instant;
use tracing::debug;

use crate::domain::ProtocolKind;
use crate::error::ProtocolError;

use super::{ProtocolPort, ProtocolRequest, ProtocolResponse};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 10;

/// Client settings shared by the HTTP, GraphQL, and SOAP ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub insecure: bool,
    pub follow_redirects: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: format!("loadsmith/{}", env!("CARGO_PKG_VERSION")),
            insecure: false,
            follow_redirects: true,
        }
    }
}

/// Builds the one client every HTTP-family port shares.
///
/// # Errors
///
/// Returns an error when the TLS backend cannot be initialised.
pub fn build_client(settings: &HttpSettings) -> Result<Client, ProtocolError> {
    let policy = if settings.follow_redirects {
        redirect::Policy::limited(MAX_REDIRECTS)
    } else {
        redirect::Policy::none()
    };
    Client::builder()
        .timeout(settings.timeout)
        .connect_timeout(settings.connect_timeout)
        .user_agent(settings.user_agent.as_str())
        .danger_accept_invalid_certs(settings.insecure)
        .redirect(policy)
        .build()
        .map_err(|err| ProtocolError::BuildClient { source: err })
}

/// Plain HTTP: method, headers, query params, and an optional body.
#[derive(Debug, Clone)]
pub struct HttpPort {
    client: Client,
}

impl HttpPort {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProtocolPort for HttpPort {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Http
    }

    async fn execute(&self, request: &ProtocolRequest) -> Result<ProtocolResponse, ProtocolError> {
        let method = parse_method(&request.method, ProtocolKind::Http)?;
        let mut builder = prepare(&self.client, method, request)?;
        if let Some(body) = request.body.as_ref() {
            builder = builder.body(body.clone());
        }
        let exchange = send(&self.client, builder).await?;
        Ok(exchange.into_response(|_| None))
    }
}

pub(super) fn parse_method(method: &str, protocol: ProtocolKind) -> Result<Method, ProtocolError> {
    Method::from_bytes(method.as_bytes()).map_err(|_err| ProtocolError::InvalidMethod {
        method: method.to_owned(),
        protocol: protocol.as_str(),
    })
}

pub(super) fn parse_endpoint(endpoint: &str) -> Result<Url, ProtocolError> {
    Url::parse(endpoint).map_err(|err| ProtocolError::InvalidEndpoint {
        url: endpoint.to_owned(),
        source: err,
    })
}

/// Request builder with url, query params, and headers applied.
pub(super) fn prepare(
    client: &Client,
    method: Method,
    request: &ProtocolRequest,
) -> Result<RequestBuilder, ProtocolError> {
    let mut url = parse_endpoint(&request.endpoint)?;
    if !request.params.is_empty() {
        url.query_pairs_mut().extend_pairs(request.params.iter());
    }
    let headers = header_map(&request.headers)?;
    Ok(client.request(method, url).headers(headers))
}

pub(super) fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ProtocolError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_err| {
            ProtocolError::InvalidHeader { name: name.clone() }
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|_err| {
            ProtocolError::InvalidHeader { name: name.clone() }
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Raw result of one HTTP exchange before protocol-specific judgement.
pub(super) enum Exchange {
    Received {
        status: reqwest::StatusCode,
        headers: BTreeMap<String, String>,
        body: Vec<u8>,
        latency: Duration,
        elapsed: Duration,
    },
    Failed {
        message: String,
        elapsed: Duration,
    },
}

impl Exchange {
    /// Converts the exchange into a response. `body_failure` inspects a 2xx
    /// body and returns a failure message when the payload reports an error.
    pub(super) fn into_response<F>(self, body_failure: F) -> ProtocolResponse
    where
        F: FnOnce(&[u8]) -> Option<String>,
    {
        match self {
            Exchange::Received {
                status,
                headers,
                body,
                latency,
                elapsed,
            } => {
                let reason = status.canonical_reason().unwrap_or("Unknown").to_owned();
                let payload_failure = if status.is_success() {
                    body_failure(&body)
                } else {
                    None
                };
                let success = status.is_success() && payload_failure.is_none();
                ProtocolResponse {
                    success,
                    status_code: status.as_u16(),
                    message: payload_failure.unwrap_or(reason),
                    body,
                    elapsed,
                    latency,
                    headers,
                }
            }
            Exchange::Failed { message, elapsed } => {
                ProtocolResponse::no_response(message, elapsed)
            }
        }
    }
}

/// Sends the request and reads the full body. Transport failures become
/// [`Exchange::Failed`]; only an unbuildable request is an error.
pub(super) async fn send(client: &Client, builder: RequestBuilder) -> Result<Exchange, ProtocolError> {
    let request = builder
        .build()
        .map_err(|err| ProtocolError::BuildRequest { source: err })?;
    let started = Instant::now();
    let response = match client.execute(request).await {
        Ok(response) => response,
        Err(err) => {
            debug!("Request failed: {}", err);
            return Ok(Exchange::Failed {
                message: describe_transport_error(&err),
                elapsed: started.elapsed(),
            });
        }
    };
    let latency = started.elapsed();
    let status = response.status();
    let headers = collect_headers(&response);
    match response.bytes().await {
        Ok(body) => Ok(Exchange::Received {
            status,
            headers,
            body: body.to_vec(),
            latency,
            elapsed: started.elapsed(),
        }),
        Err(err) => {
            debug!("Failed to read response body: {}", err);
            Ok(Exchange::Failed {
                message: describe_transport_error(&err),
                elapsed: started.elapsed(),
            })
        }
    }
}

fn collect_headers(response: &Response) -> BTreeMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_owned(), value.to_owned()))
        })
        .collect()
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("Request timed out: {}", err)
    } else if err.is_connect() {
        format!("Connection failed: {}", err)
    } else {
        format!("Request failed: {}", err)
    }
}
