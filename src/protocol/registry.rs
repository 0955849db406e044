use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Client;

use crate::domain::{ProtocolKind, Scenario};
use crate::error::{ConfigError, ProtocolError};

use super::{GraphqlPort, HttpPort, ProtocolPort, SimulatedPort, SimulatedSettings, SoapPort};

/// Ports selected for one run, keyed by protocol. Built explicitly at startup
/// and handed to the engine.
#[derive(Clone, Default)]
pub struct ProtocolRegistry {
    ports: BTreeMap<ProtocolKind, Arc<dyn ProtocolPort>>,
}

impl ProtocolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// HTTP, GraphQL, and SOAP ports sharing `client`.
    #[must_use]
    pub fn with_http_family(client: &Client) -> Self {
        let mut registry = Self::new();
        registry.insert(Arc::new(HttpPort::new(client.clone())));
        registry.insert(Arc::new(GraphqlPort::new(client.clone())));
        registry.insert(Arc::new(SoapPort::new(client.clone())));
        registry
    }

    #[must_use]
    pub fn with_simulated(mut self, settings: SimulatedSettings) -> Self {
        self.insert(Arc::new(SimulatedPort::new(settings)));
        self
    }

    /// Registers a port.
    ///
    /// # Errors
    ///
    /// Returns an error when a port for the same protocol is already
    /// registered.
    pub fn register<P>(&mut self, port: P) -> Result<(), ProtocolError>
    where
        P: ProtocolPort + 'static,
    {
        let protocol = port.protocol();
        if self.ports.contains_key(&protocol) {
            return Err(ProtocolError::Adapter {
                message: format!("Protocol port already registered: {}", protocol.as_str()),
            });
        }
        self.insert(Arc::new(port));
        Ok(())
    }

    fn insert(&mut self, port: Arc<dyn ProtocolPort>) {
        self.ports.insert(port.protocol(), port);
    }

    #[must_use]
    pub fn port(&self, protocol: ProtocolKind) -> Option<Arc<dyn ProtocolPort>> {
        self.ports.get(&protocol).cloned()
    }

    #[must_use]
    pub fn protocols(&self) -> Vec<ProtocolKind> {
        self.ports.keys().copied().collect()
    }

    /// Checks that every request in `scenarios` has a port.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first request whose protocol is missing.
    pub fn ensure_supported(&self, scenarios: &[Scenario]) -> Result<(), ConfigError> {
        for scenario in scenarios {
            for request in scenario.requests() {
                if !self.ports.contains_key(&request.protocol()) {
                    return Err(ConfigError::UnsupportedProtocol {
                        protocol: request.protocol().as_str().to_owned(),
                        request: format!("{}/{}", scenario.name(), request.name()),
                    });
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProtocolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolRegistry")
            .field("protocols", &self.protocols())
            .finish()
    }
}
