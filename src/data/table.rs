use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::{ReaderBuilder, Trim};

use crate::error::DataSourceError;

/// One row keyed by column header. Shared, never copied per iteration.
pub type DataRow = Arc<BTreeMap<String, String>>;

/// Immutable rows loaded once and read concurrently by every worker.
#[derive(Debug, Clone)]
pub struct DataTable {
    path: PathBuf,
    columns: Vec<String>,
    rows: Vec<DataRow>,
}

impl DataTable {
    /// Reads a delimited file with a header row. Quoted fields may contain
    /// the delimiter; short rows simply omit the trailing columns.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be opened or parsed, has no
    /// header, or has no data rows.
    pub fn load(path: &Path, delimiter: u8) -> Result<Self, DataSourceError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .trim(Trim::Headers)
            .from_path(path)
            .map_err(|err| DataSourceError::Open {
                path: path.to_path_buf(),
                source: err,
            })?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|err| DataSourceError::Read {
                path: path.to_path_buf(),
                line: 1,
                source: err,
            })?
            .iter()
            .map(str::to_owned)
            .collect();
        if columns.iter().all(String::is_empty) {
            return Err(DataSourceError::MissingHeader {
                path: path.to_path_buf(),
            });
        }

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result.map_err(|err| DataSourceError::Read {
                path: path.to_path_buf(),
                line: u64::try_from(idx).unwrap_or(u64::MAX).saturating_add(2),
                source: err,
            })?;
            let row: BTreeMap<String, String> = columns
                .iter()
                .zip(record.iter())
                .map(|(column, value)| (column.clone(), value.to_owned()))
                .collect();
            rows.push(Arc::new(row));
        }
        if rows.is_empty() {
            return Err(DataSourceError::Empty {
                path: path.to_path_buf(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            columns,
            rows,
        })
    }

    #[must_use]
    pub fn from_rows(columns: Vec<String>, rows: Vec<BTreeMap<String, String>>) -> Self {
        Self {
            path: PathBuf::new(),
            columns,
            rows: rows.into_iter().map(Arc::new).collect(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Row `index` modulo the row count.
    ///
    /// # Errors
    ///
    /// Returns an error when the table has no rows.
    pub fn row(&self, index: u64) -> Result<DataRow, DataSourceError> {
        let len = u64::try_from(self.rows.len()).unwrap_or(u64::MAX);
        let selected = index
            .checked_rem(len)
            .and_then(|idx| usize::try_from(idx).ok())
            .ok_or(DataSourceError::NoRows)?;
        self.rows
            .get(selected)
            .cloned()
            .ok_or(DataSourceError::NoRows)
    }
}

/// Parses a one-character delimiter; `\t` and `tab` select a tab.
///
/// # Errors
///
/// Returns an error for anything but a single ASCII character.
pub fn parse_delimiter(value: &str) -> Result<u8, DataSourceError> {
    match value {
        "\\t" | "tab" | "\t" => return Ok(b'\t'),
        _ => {}
    }
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(DataSourceError::InvalidDelimiter {
            value: value.to_owned(),
        }),
    }
}
