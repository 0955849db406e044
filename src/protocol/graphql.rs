use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Method};
use serde_json::{Map, Value, json};

use crate::domain::ProtocolKind;
use crate::error::ProtocolError;

use super::http::{parse_method, prepare, send};
use super::{ProtocolPort, ProtocolRequest, ProtocolResponse};

/// GraphQL over HTTP. The request body is the query document and the
/// request-scoped variables become the operation variables.
#[derive(Debug, Clone)]
pub struct GraphqlPort {
    client: Client,
}

impl GraphqlPort {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProtocolPort for GraphqlPort {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Graphql
    }

    async fn execute(&self, request: &ProtocolRequest) -> Result<ProtocolResponse, ProtocolError> {
        let method = parse_method(&request.method, ProtocolKind::Graphql)?;
        let query = request.body.as_deref().unwrap_or_default();
        let variables: Map<String, Value> = request
            .variables
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();

        let builder = if method == Method::GET {
            let encoded_vars = serde_json::to_string(&variables)
                .map_err(|err| ProtocolError::EncodeBody { source: err })?;
            prepare(&self.client, method, request)?
                .query(&[("query", query), ("variables", encoded_vars.as_str())])
        } else if method == Method::POST {
            let payload = json!({ "query": query, "variables": variables });
            let body = serde_json::to_vec(&payload)
                .map_err(|err| ProtocolError::EncodeBody { source: err })?;
            let mut builder = prepare(&self.client, method, request)?;
            if !request
                .headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case("content-type"))
            {
                builder = builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            builder.body(body)
        } else {
            return Err(ProtocolError::InvalidMethod {
                method: request.method.clone(),
                protocol: ProtocolKind::Graphql.as_str(),
            });
        };

        let exchange = send(&self.client, builder).await?;
        Ok(exchange.into_response(graphql_errors))
    }
}

/// First error message when the payload carries a non-empty `errors` array.
pub(super) fn graphql_errors(body: &[u8]) -> Option<String> {
    let payload: Value = serde_json::from_slice(body).ok()?;
    let errors = payload.get("errors")?.as_array()?;
    let first = errors.first()?;
    let message = first
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("GraphQL error");
    Some(format!("GraphQL error: {}", message))
}
