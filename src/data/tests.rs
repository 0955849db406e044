use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use super::*;
use crate::domain::DataSourceRef;
use crate::error::DataSourceError;

fn write_csv(contents: &str) -> Result<NamedTempFile, DataSourceError> {
    let mut file = NamedTempFile::new()
        .map_err(|err| DataSourceError::from(format!("tempfile: {}", err)))?;
    file.write_all(contents.as_bytes())
        .map_err(|err| DataSourceError::from(format!("write: {}", err)))?;
    Ok(file)
}

fn user_at(table: &DataTable, index: u64) -> Result<String, DataSourceError> {
    let row = table.row(index)?;
    row.get("user")
        .cloned()
        .ok_or(DataSourceError::from("missing user column"))
}

#[test]
fn rows_wrap_modulo_row_count() -> Result<(), DataSourceError> {
    let file = write_csv("user,pass\nalice,a1\nbob,b2\ncarol,c3\n")?;
    let table = DataTable::load(file.path(), b',')?;
    if table.row_count() != 3 {
        return Err(DataSourceError::from(format!(
            "Expected 3 rows, got {}",
            table.row_count()
        )));
    }
    if table.row(3)? != table.row(0)? || table.row(5)? != table.row(2)? {
        return Err(DataSourceError::from("Rows should wrap around"));
    }
    if user_at(&table, 4)? != "bob" {
        return Err(DataSourceError::from("Row 4 should be bob"));
    }
    Ok(())
}

#[test]
fn quoted_fields_may_contain_delimiter() -> Result<(), DataSourceError> {
    let file = write_csv("user,address\n\"smith, j\",\"1 Main St, Springfield\"\n")?;
    let table = DataTable::load(file.path(), b',')?;
    let row = table.row(0)?;
    if row.get("address").map(String::as_str) != Some("1 Main St, Springfield") {
        return Err(DataSourceError::from(format!("Unexpected row {:?}", row)));
    }
    if user_at(&table, 0)? != "smith, j" {
        return Err(DataSourceError::from("Quoted user not preserved"));
    }
    Ok(())
}

#[test]
fn custom_delimiter_is_honoured() -> Result<(), DataSourceError> {
    let file = write_csv("user;id\nalice;1\n")?;
    let table = DataTable::load(file.path(), parse_delimiter(";")?)?;
    if table.columns() != ["user".to_owned(), "id".to_owned()] {
        return Err(DataSourceError::from(format!(
            "Unexpected columns {:?}",
            table.columns()
        )));
    }
    Ok(())
}

#[test]
fn header_only_file_is_empty() -> Result<(), DataSourceError> {
    let file = write_csv("user,pass\n")?;
    match DataTable::load(file.path(), b',') {
        Err(DataSourceError::Empty { .. }) => Ok(()),
        other => Err(DataSourceError::from(format!(
            "Expected Empty, got {:?}",
            other
        ))),
    }
}

#[test]
fn empty_table_row_lookup_fails() -> Result<(), DataSourceError> {
    let table = DataTable::from_rows(vec!["user".to_owned()], Vec::new());
    match table.row(0) {
        Err(DataSourceError::NoRows) => Ok(()),
        other => Err(DataSourceError::from(format!(
            "Expected NoRows, got {:?}",
            other
        ))),
    }
}

#[test]
fn optional_source_falls_back_to_no_overlay() -> Result<(), DataSourceError> {
    let missing = PathBuf::from("/nonexistent/loadsmith/users.csv");
    let optional = DataSourceRef::new(missing.clone(), false, b',');
    if bind("checkout", Some(&optional))?.is_some() {
        return Err(DataSourceError::from("Optional source should be skipped"));
    }
    let required = DataSourceRef::new(missing, true, b',');
    match bind("checkout", Some(&required)) {
        Err(DataSourceError::Open { .. }) => Ok(()),
        other => Err(DataSourceError::from(format!(
            "Expected Open error, got {:?}",
            other.map(|table| table.is_some())
        ))),
    }
}

#[test]
fn delimiter_parsing_rejects_multichar_values() -> Result<(), DataSourceError> {
    if parse_delimiter("tab")? != b'\t' {
        return Err(DataSourceError::from("tab should map to \\t"));
    }
    match parse_delimiter(";;") {
        Err(DataSourceError::InvalidDelimiter { .. }) => Ok(()),
        other => Err(DataSourceError::from(format!(
            "Expected InvalidDelimiter, got {:?}",
            other
        ))),
    }
}
