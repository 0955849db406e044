use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::graphql::graphql_errors;
use super::soap::soap_fault;
use super::*;
use crate::domain::{LogicalRequest, ProtocolKind, Scenario};
use crate::error::{AppError, AppResult, ConfigError, ProtocolError};

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::config(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

/// Serves `status_line` with `body` to every connection; `{request_line}` in
/// the body is replaced with the first line of the incoming request.
async fn spawn_server(status_line: &'static str, body: &'static str) -> AppResult<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buffer = vec![0u8; 8192];
                let Ok(read) = stream.read(&mut buffer).await else {
                    return;
                };
                let request = String::from_utf8_lossy(buffer.get(..read).unwrap_or_default());
                let request_line = request.lines().next().unwrap_or_default().to_owned();
                let payload = body.replace("{request_line}", &request_line);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    payload.len(),
                    payload
                );
                drop(stream.write_all(response.as_bytes()).await);
                drop(stream.shutdown().await);
            });
        }
    });
    Ok(format!("http://{}", addr))
}

fn client() -> AppResult<reqwest::Client> {
    let settings = HttpSettings {
        timeout: Duration::from_secs(5),
        ..HttpSettings::default()
    };
    Ok(build_client(&settings)?)
}

fn request(endpoint: String, method: &str) -> ProtocolRequest {
    ProtocolRequest {
        endpoint,
        method: method.to_owned(),
        ..ProtocolRequest::default()
    }
}

#[test]
fn http_success_carries_status_and_body() -> AppResult<()> {
    run_async_test(async {
        let base = spawn_server("200 OK", "{request_line}").await?;
        let port = HttpPort::new(client()?);
        let mut req = request(format!("{}/items", base), "GET");
        req.params.insert("page".to_owned(), "2".to_owned());
        let response = port.execute(&req).await?;
        if !response.success || response.status_code != 200 {
            return Err(AppError::config(format!("Unexpected response {:?}", response)));
        }
        let echoed = String::from_utf8_lossy(&response.body).into_owned();
        if !echoed.starts_with("GET /items?page=2 ") {
            return Err(AppError::config(format!("Unexpected request line '{}'", echoed)));
        }
        if req.url() != format!("{}/items?page=2", base) {
            return Err(AppError::config(format!("Recorded url '{}' differs", req.url())));
        }
        if response.latency > response.elapsed {
            return Err(AppError::config("Latency cannot exceed elapsed"));
        }
        Ok(())
    })
}

#[test]
fn http_error_status_is_an_unsuccessful_response() -> AppResult<()> {
    run_async_test(async {
        let base = spawn_server("404 Not Found", "missing").await?;
        let port = HttpPort::new(client()?);
        let response = port.execute(&request(base, "GET")).await?;
        if response.success || response.status_code != 404 || response.message != "Not Found" {
            return Err(AppError::config(format!("Unexpected response {:?}", response)));
        }
        Ok(())
    })
}

#[test]
fn refused_connection_is_not_an_error() -> AppResult<()> {
    run_async_test(async {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);
        let port = HttpPort::new(client()?);
        let response = port.execute(&request(format!("http://{}/", addr), "GET")).await?;
        if response.success || response.status_code != 0 || response.message.is_empty() {
            return Err(AppError::config(format!("Unexpected response {:?}", response)));
        }
        Ok(())
    })
}

#[test]
fn malformed_endpoint_and_method_are_errors() -> AppResult<()> {
    run_async_test(async {
        let port = HttpPort::new(client()?);
        match port.execute(&request("not a url".to_owned(), "GET")).await {
            Err(ProtocolError::InvalidEndpoint { .. }) => {}
            other => {
                return Err(AppError::config(format!(
                    "Expected InvalidEndpoint, got {:?}",
                    other
                )));
            }
        }
        match port
            .execute(&request("http://127.0.0.1:1/".to_owned(), "GE T"))
            .await
        {
            Err(ProtocolError::InvalidMethod { .. }) => Ok(()),
            other => Err(AppError::config(format!(
                "Expected InvalidMethod, got {:?}",
                other
            ))),
        }
    })
}

#[test]
fn graphql_errors_array_marks_failure() -> AppResult<()> {
    run_async_test(async {
        let base = spawn_server(
            "200 OK",
            r#"{"data":null,"errors":[{"message":"unknown field"}]}"#,
        )
        .await?;
        let port = GraphqlPort::new(client()?);
        let mut req = request(base, "POST");
        req.body = Some("{ me { id } }".to_owned());
        let response = port.execute(&req).await?;
        if response.success || response.status_code != 200 {
            return Err(AppError::config(format!("Unexpected response {:?}", response)));
        }
        if response.message != "GraphQL error: unknown field" {
            return Err(AppError::config(format!("Unexpected message {}", response.message)));
        }
        Ok(())
    })
}

#[test]
fn payload_inspection_helpers() -> AppResult<()> {
    if graphql_errors(br#"{"data":{"ok":true},"errors":[]}"#).is_some() {
        return Err(AppError::config("Empty errors array is a success"));
    }
    if graphql_errors(b"not json").is_some() {
        return Err(AppError::config("Non-JSON body is judged by status only"));
    }
    let fault = soap_fault(
        b"<soap:Envelope><soap:Body><soap:Fault><faultstring>Bad input</faultstring></soap:Fault></soap:Body></soap:Envelope>",
    );
    if fault.as_deref() != Some("SOAP fault: Bad input") {
        return Err(AppError::config(format!("Unexpected fault {:?}", fault)));
    }
    if soap_fault(b"<soap:Envelope><soap:Body><ok/></soap:Body></soap:Envelope>").is_some() {
        return Err(AppError::config("Envelope without Fault is a success"));
    }
    Ok(())
}

#[test]
fn soap_requires_post() -> AppResult<()> {
    run_async_test(async {
        let port = SoapPort::new(client()?);
        match port
            .execute(&request("http://127.0.0.1:1/ws".to_owned(), "GET"))
            .await
        {
            Err(ProtocolError::InvalidMethod { protocol: "soap", .. }) => Ok(()),
            other => Err(AppError::config(format!(
                "Expected InvalidMethod, got {:?}",
                other
            ))),
        }
    })
}

#[test]
fn simulated_port_reports_configured_latency() -> AppResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .map_err(|err| AppError::config(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(async {
        let port = SimulatedPort::new(
            SimulatedSettings::constant(Duration::from_millis(100)).with_response_bytes(16),
        );
        let response = port.execute(&request("sim://a".to_owned(), "GET")).await?;
        if !response.success || response.elapsed != Duration::from_millis(100) {
            return Err(AppError::config(format!("Unexpected response {:?}", response)));
        }
        if response.bytes() != 16 {
            return Err(AppError::config("Expected 16 body bytes"));
        }

        let failing = SimulatedPort::new(
            SimulatedSettings::constant(Duration::ZERO).with_failure_percent(100),
        );
        let response = failing.execute(&request("sim://a".to_owned(), "GET")).await?;
        if response.success || response.status_code != 500 {
            return Err(AppError::config(format!("Unexpected response {:?}", response)));
        }
        Ok(())
    })
}

#[test]
fn simulated_settings_reject_inverted_range() -> AppResult<()> {
    match SimulatedSettings::new(Duration::from_millis(50), Duration::from_millis(10)) {
        Err(ConfigError::SimulatedLatencyRange { min: 50, max: 10 }) => Ok(()),
        other => Err(AppError::config(format!(
            "Expected SimulatedLatencyRange, got {:?}",
            other
        ))),
    }
}

#[test]
fn registry_rejects_duplicates_and_reports_missing_ports() -> AppResult<()> {
    let mut registry = ProtocolRegistry::with_http_family(&client()?);
    if registry
        .register(SoapPort::new(client()?))
        .is_ok()
    {
        return Err(AppError::config("Duplicate soap port should be rejected"));
    }
    let scenarios = vec![Scenario::new(
        "dry",
        vec![LogicalRequest::new("tick", ProtocolKind::Simulated, "sim://tick")],
    )];
    match registry.ensure_supported(&scenarios) {
        Err(ConfigError::UnsupportedProtocol { protocol, request }) => {
            if protocol != "simulated" || request != "dry/tick" {
                return Err(AppError::config(format!("{} {}", protocol, request)));
            }
        }
        other => {
            return Err(AppError::config(format!(
                "Expected UnsupportedProtocol, got {:?}",
                other
            )));
        }
    }
    let registry = registry.with_simulated(SimulatedSettings::constant(Duration::ZERO));
    registry.ensure_supported(&scenarios)?;
    if registry.protocols().len() != 4 {
        return Err(AppError::config("Expected four registered ports"));
    }
    Ok(())
}

#[test]
fn request_url_appends_params_in_order() -> Result<(), String> {
    let mut req = request("http://api.test/search?lang=en".to_owned(), "GET");
    if req.url() != "http://api.test/search?lang=en" {
        return Err(format!("Params-free url changed: {}", req.url()));
    }
    req.params.insert("q".to_owned(), "load test".to_owned());
    req.params.insert("page".to_owned(), "2".to_owned());
    if req.url() != "http://api.test/search?lang=en&page=2&q=load+test" {
        return Err(format!("Unexpected url {}", req.url()));
    }
    let mut relative = request("/items".to_owned(), "GET");
    relative.params.insert("id".to_owned(), "7".to_owned());
    if relative.url() != "/items?id=7" {
        return Err(format!("Unexpected fallback url {}", relative.url()));
    }
    Ok(())
}
