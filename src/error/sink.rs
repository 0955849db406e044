use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to create '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write result log '{path}': {source}")]
    WriteLog {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Failed to flush '{path}': {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read result log '{path}': {source}")]
    ReadLog {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Result log '{path}' is missing column '{column}'.")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("Result log '{path}' line {line}: invalid {column} value '{value}'.")]
    InvalidField {
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("Failed to serialize summary: {source}")]
    SerializeSummary {
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to write summary '{path}': {source}")]
    WriteSummary {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write line: {source}")]
    WriteLine {
        #[source]
        source: std::fmt::Error,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
