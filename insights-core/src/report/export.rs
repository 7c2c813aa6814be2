//! CSV downloads: the top-N slice and the full table.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::analytics::top_by_balance;
use crate::data::fetch::write_atomic;
use crate::data::DataError;
use crate::domain::{BalanceTable, SCHEMA_COLUMNS};

/// File name of the full-table download.
pub const FULL_EXPORT_FILENAME: &str = "celo_balances.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV writer: {0}")]
    Flush(String),

    #[error("CSV output is not valid UTF-8")]
    Utf8,

    #[error(transparent)]
    Write(#[from] DataError),

    #[error("refusing to overwrite the source table {0}; choose another export directory")]
    WouldOverwriteSource(PathBuf),
}

/// File name of the top-N download, e.g. `top20_celo_balances.csv`.
pub fn top_export_filename(n: usize) -> String {
    format!("top{n}_celo_balances.csv")
}

#[derive(Serialize)]
struct TopRow<'a> {
    address: &'a str,
    balance: f64,
}

/// Top-N rows as CSV with columns `address,balance`, largest first.
pub fn top_n_csv(table: &BalanceTable, n: usize) -> Result<String, ExportError> {
    let mut wtr = headerless_writer();
    wtr.write_record(["address", "balance"])?;
    for record in top_by_balance(table, n) {
        wtr.serialize(TopRow {
            address: &record.address,
            balance: record.balance,
        })?;
    }
    finish(wtr)
}

/// Every row in file order with the five schema columns. Missing flow
/// values are written as empty cells.
pub fn full_table_csv(table: &BalanceTable) -> Result<String, ExportError> {
    let mut wtr = headerless_writer();
    wtr.write_record(SCHEMA_COLUMNS)?;
    for record in table {
        wtr.serialize(record)?;
    }
    finish(wtr)
}

// Headers are written explicitly so empty tables still get one.
fn headerless_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![])
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Flush(e.to_string()))?;
    String::from_utf8(data).map_err(|_| ExportError::Utf8)
}

/// Paths written by [`export_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub top: PathBuf,
    pub full: PathBuf,
}

/// Write `contents` to `dir/name`, creating `dir` if needed.
///
/// Fails without writing when `dir/name` is the `source` table itself.
pub fn write_export(
    dir: &Path,
    name: &str,
    contents: &str,
    source: &Path,
) -> Result<PathBuf, ExportError> {
    let path = dir.join(name);
    if is_same_file(&path, source) {
        return Err(ExportError::WouldOverwriteSource(path));
    }
    write_atomic(&path, contents.as_bytes())?;
    info!(path = %path.display(), bytes = contents.len(), "export written");
    Ok(path)
}

/// Write both downloads into `dir`, never over `source`.
pub fn export_all(
    table: &BalanceTable,
    top_n: usize,
    dir: &Path,
    source: &Path,
) -> Result<ExportPaths, ExportError> {
    let top = write_export(dir, &top_export_filename(top_n), &top_n_csv(table, top_n)?, source)?;
    let full = write_export(dir, FULL_EXPORT_FILENAME, &full_table_csv(table)?, source)?;
    Ok(ExportPaths { top, full })
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BalanceRecord;

    fn sample() -> BalanceTable {
        BalanceTable::new(vec![
            BalanceRecord::new("A", 100.0).with_flows(1.0, 2.0, -1.0),
            BalanceRecord::new("B", 50.0),
            BalanceRecord::new("C", 300.5),
        ])
    }

    #[test]
    fn top_csv_is_ranked() {
        let csv = top_n_csv(&sample(), 2).unwrap();
        assert_eq!(csv, "address,balance\nC,300.5\nA,100.0\n");
    }

    #[test]
    fn full_csv_keeps_file_order_and_empty_flows() {
        let csv = full_table_csv(&sample()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "address,balance,tokens_in,tokens_out,balance_changed");
        assert_eq!(lines[1], "A,100.0,1.0,2.0,-1.0");
        assert_eq!(lines[2], "B,50.0,,,");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn empty_table_exports_headers_only() {
        let empty = BalanceTable::default();
        assert_eq!(top_n_csv(&empty, 20).unwrap(), "address,balance\n");
        assert_eq!(
            full_table_csv(&empty).unwrap(),
            "address,balance,tokens_in,tokens_out,balance_changed\n"
        );
    }

    #[test]
    fn filenames() {
        assert_eq!(top_export_filename(20), "top20_celo_balances.csv");
        assert_eq!(top_export_filename(5), "top5_celo_balances.csv");
    }

    #[test]
    fn export_all_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/exports");
        let source = dir.path().join("data/celo_balances.csv");
        let paths = export_all(&sample(), 20, &out, &source).unwrap();
        assert_eq!(paths.top, out.join("top20_celo_balances.csv"));
        assert_eq!(paths.full, out.join(FULL_EXPORT_FILENAME));
        let top = std::fs::read_to_string(&paths.top).unwrap();
        assert!(top.starts_with("address,balance\nC,300.5\n"));
        assert!(paths.full.exists());
    }

    #[test]
    fn export_refuses_to_overwrite_source_table() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        let source = data.join("celo_balances.csv");
        let original = "address,balance,tokens_in,tokens_out,balance_changed\nA,200,,,\n";
        std::fs::write(&source, original).unwrap();

        let err = export_all(&sample(), 20, &data, &source).unwrap_err();
        assert!(matches!(err, ExportError::WouldOverwriteSource(ref p) if *p == source));
        assert_eq!(std::fs::read_to_string(&source).unwrap(), original);

        // Same file reached through a different spelling of the directory.
        let dotted = data.join(".");
        let err = write_export(&dotted, FULL_EXPORT_FILENAME, "x", &source).unwrap_err();
        assert!(matches!(err, ExportError::WouldOverwriteSource(_)));
        assert_eq!(std::fs::read_to_string(&source).unwrap(), original);
    }
}
