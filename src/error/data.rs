use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("Failed to open data source '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Failed to read data source '{path}' at record {line}: {source}")]
    Read {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error("Data source '{path}' has no header row.")]
    MissingHeader { path: PathBuf },
    #[error("Data source '{path}' has no data rows.")]
    Empty { path: PathBuf },
    #[error("Data source has no rows to select from.")]
    NoRows,
    #[error("Invalid delimiter '{value}'. Use a single ASCII character.")]
    InvalidDelimiter { value: String },
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
