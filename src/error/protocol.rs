use thiserror::Error;

/// Errors a protocol adapter raises for programming or configuration mistakes.
///
/// Ordinary failures (refused connections, non-2xx statuses, timeouts) are not
/// errors; adapters report them as unsuccessful responses.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid endpoint '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported method '{method}' for {protocol}.")]
    InvalidMethod {
        method: String,
        protocol: &'static str,
    },
    #[error("Invalid header '{name}'.")]
    InvalidHeader { name: String },
    #[error("Failed to build request: {source}")]
    BuildRequest {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to encode request body: {source}")]
    EncodeBody {
        #[source]
        source: serde_json::Error,
    },
    #[error("Protocol adapter panicked: {message}")]
    Panicked { message: String },
    #[error("{message}")]
    Adapter { message: String },
}
