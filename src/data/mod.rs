//! Tabular data sources that drive per-iteration variable overlays.
mod table;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::DataSourceRef;
use crate::error::DataSourceError;

pub use table::{DataRow, DataTable, parse_delimiter};

/// Loads the data source bound to `scenario`, if any.
///
/// An optional source that cannot be read is logged and the scenario runs
/// without a row overlay.
///
/// # Errors
///
/// Returns an error when a required source is missing, unreadable, or empty.
pub fn bind(
    scenario: &str,
    source: Option<&DataSourceRef>,
) -> Result<Option<Arc<DataTable>>, DataSourceError> {
    let Some(source) = source else {
        return Ok(None);
    };
    match DataTable::load(source.path(), source.delimiter()) {
        Ok(table) => {
            info!(
                "Scenario '{}' bound to data source '{}' ({} rows).",
                scenario,
                source.path().display(),
                table.row_count()
            );
            Ok(Some(Arc::new(table)))
        }
        Err(err) if source.required() => Err(err),
        Err(err) => {
            warn!(
                "Scenario '{}' runs without data rows: {}",
                scenario, err
            );
            Ok(None)
        }
    }
}
