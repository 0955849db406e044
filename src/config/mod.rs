//! Configuration loading and application.
mod apply;
mod loader;
mod parse;
pub mod types;


pub use apply::{RunSettings, apply_config};
pub use loader::{DEFAULT_CONFIG_FILES, LoadedConfig, load_config};
