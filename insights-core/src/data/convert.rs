//! JSON query result → CSV conversion.
//!
//! Input shape: `{"result": {"rows": [{col: val, ...}], "metadata": {"column_names": [...]}}}`.
//! Output: header row equal to `column_names`, then one record per entry of
//! `rows` in array order, projected onto the header columns.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use super::fetch::write_atomic;
use super::provider::DataError;

/// Errors from the conversion stage.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input is not a query result document: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("row {row} has column '{column}' that is not listed in column_names")]
    UnknownColumn { row: usize, column: String },

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output is not valid UTF-8")]
    Utf8,

    #[error(transparent)]
    Write(#[from] DataError),
}

#[derive(Debug, Deserialize)]
struct QueryResultDocument {
    result: QueryResultBody,
}

#[derive(Debug, Deserialize)]
struct QueryResultBody {
    rows: Vec<Map<String, Value>>,
    metadata: QueryResultMetadata,
}

#[derive(Debug, Deserialize)]
struct QueryResultMetadata {
    column_names: Vec<String>,
}

/// A converted table: the CSV text plus its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedTable {
    pub csv: String,
    pub columns: Vec<String>,
    pub rows: usize,
}

/// Convert a JSON query result document to CSV text.
pub fn json_to_csv(json: &str) -> Result<ConvertedTable, ConvertError> {
    let doc: QueryResultDocument = serde_json::from_str(json)?;
    let columns = doc.result.metadata.column_names;
    let rows = doc.result.rows;

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(&columns)?;

    for (i, row) in rows.iter().enumerate() {
        if let Some(unknown) = row.keys().find(|k| !columns.contains(k)) {
            return Err(ConvertError::UnknownColumn {
                row: i,
                column: unknown.clone(),
            });
        }
        let record: Vec<String> = columns
            .iter()
            .map(|col| row.get(col).map(scalar_to_cell).unwrap_or_default())
            .collect();
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().map_err(|e| ConvertError::Csv(e.into_error().into()))?;
    let csv = String::from_utf8(data).map_err(|_| ConvertError::Utf8)?;

    Ok(ConvertedTable {
        csv,
        columns,
        rows: rows.len(),
    })
}

/// Read `input` JSON and write the converted CSV to `output`.
pub fn convert_file(input: &Path, output: &Path) -> Result<ConvertedTable, ConvertError> {
    let json = std::fs::read_to_string(input).map_err(|source| ConvertError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let table = json_to_csv(&json)?;
    write_atomic(output, table.csv.as_bytes())?;
    info!(
        input = %input.display(),
        output = %output.display(),
        rows = table.rows,
        columns = table.columns.len(),
        "converted query result to CSV"
    );
    Ok(table)
}

/// Render one JSON scalar as CSV cell text.
///
/// Booleans are written as `True`/`False` and null as an empty cell. Nested
/// values are written as compact JSON.
pub fn scalar_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
