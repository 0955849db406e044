//! Protocol ports: the boundary between the engine and concrete wire calls.
mod graphql;
mod http;
mod registry;
mod simulated;
mod soap;
mod traits;

#[cfg(test)]
mod tests;

pub use graphql::GraphqlPort;
pub use http::{HttpPort, HttpSettings, build_client};
pub use registry::ProtocolRegistry;
pub use simulated::{SimulatedPort, SimulatedSettings};
pub use soap::SoapPort;
pub use traits::{ProtocolPort, ProtocolRequest, ProtocolResponse};
