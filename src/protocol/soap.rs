use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Method};

use crate::domain::ProtocolKind;
use crate::error::ProtocolError;

use super::http::{prepare, send};
use super::{ProtocolPort, ProtocolRequest, ProtocolResponse};

const SOAP_ACTION: &str = "SOAPAction";
const SOAP_ACTION_PARAM: &str = "soap_action";

/// SOAP 1.1 over HTTP POST. The action comes from a `SOAPAction` header or
/// the `soap_action` request variable.
#[derive(Debug, Clone)]
pub struct SoapPort {
    client: Client,
}

impl SoapPort {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProtocolPort for SoapPort {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Soap
    }

    async fn execute(&self, request: &ProtocolRequest) -> Result<ProtocolResponse, ProtocolError> {
        if !request.method.eq_ignore_ascii_case("POST") {
            return Err(ProtocolError::InvalidMethod {
                method: request.method.clone(),
                protocol: ProtocolKind::Soap.as_str(),
            });
        }
        let mut builder = prepare(&self.client, Method::POST, request)?;
        let has_header = |wanted: &str| {
            request
                .headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case(wanted))
        };
        if !has_header("content-type") {
            builder = builder.header(
                CONTENT_TYPE,
                HeaderValue::from_static("text/xml; charset=utf-8"),
            );
        }
        if !has_header(SOAP_ACTION) {
            let action = request
                .variables
                .get(SOAP_ACTION_PARAM)
                .cloned()
                .unwrap_or_default();
            builder = builder.header(SOAP_ACTION, format!("\"{}\"", action));
        }
        if let Some(body) = request.body.as_ref() {
            builder = builder.body(body.clone());
        }

        let exchange = send(&self.client, builder).await?;
        Ok(exchange.into_response(soap_fault))
    }
}

/// Fault string when the envelope carries a `Fault` element.
pub(super) fn soap_fault(body: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(body).ok()?;
    let has_fault = text.contains(":Fault>") || text.contains("<Fault>") || text.contains("<Fault ");
    if !has_fault {
        return None;
    }
    let reason = text
        .split_once("<faultstring>")
        .and_then(|(_, rest)| rest.split_once("</faultstring>"))
        .map_or("SOAP fault", |(reason, _)| reason.trim());
    Some(format!("SOAP fault: {}", reason))
}
