//! CLI argument types and parsing helpers.
mod cli;
mod parsers;


pub use cli::{Command, LoadsmithArgs, ReportArgs, RunArgs};
pub use parsers::{parse_threshold, parse_variable_override};
