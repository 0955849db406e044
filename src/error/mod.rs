mod app;
mod config;
mod data;
mod engine;
mod protocol;
mod sink;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use data::DataSourceError;
pub use engine::EngineError;
pub use protocol::ProtocolError;
pub use sink::SinkError;
pub use validation::ValidationError;
