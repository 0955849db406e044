//! Core library for the `loadsmith` CLI.
//!
//! The engine runs virtual users over configured scenarios, resolves
//! `${...}` variables per request, executes requests through pluggable
//! protocol ports, and aggregates the resulting records into latency,
//! throughput, and pass/fail statistics. The binary is a thin wrapper
//! around [`entry::run`].
pub mod app;
pub mod args;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod entry;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod shutdown;
pub mod shutdown_handlers;
pub mod sinks;
pub mod system;
pub mod vars;
