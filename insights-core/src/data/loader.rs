//! Balances CSV loading and the single-slot table cache.
//!
//! Load policy:
//! - all five schema columns must be present in the header (extra columns are ignored)
//! - `address` is taken verbatim, `balance` must parse as a finite number
//! - empty or non-finite flow cells (`tokens_in`, `tokens_out`, `balance_changed`) load as missing
//! - duplicate addresses and negative balances are kept and reported with a warning

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{
    BalanceRecord, BalanceTable, ADDRESS, BALANCE, BALANCE_CHANGED, SCHEMA_COLUMNS, TOKENS_IN,
    TOKENS_OUT,
};

/// Errors from the table loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open balances file {path}: {source} (run `insights convert` first)")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("balances file is missing required column '{0}'")]
    MissingColumn(String),

    #[error("line {line}: column '{column}' has invalid number '{value}'")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },
}

/// Column positions of the schema fields within a header row.
struct ColumnIndex {
    address: usize,
    balance: usize,
    tokens_in: usize,
    tokens_out: usize,
    balance_changed: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            address: find(ADDRESS)?,
            balance: find(BALANCE)?,
            tokens_in: find(TOKENS_IN)?,
            tokens_out: find(TOKENS_OUT)?,
            balance_changed: find(BALANCE_CHANGED)?,
        })
    }
}

/// Load a balances CSV from disk.
pub fn load_table(path: &Path) -> Result<BalanceTable, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse_table(file)?;
    info!(
        path = %path.display(),
        rows = table.len(),
        "loaded balances table"
    );
    Ok(table)
}

/// Parse a balances CSV from any reader.
pub fn parse_table<R: Read>(reader: R) -> Result<BalanceTable, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let index = ColumnIndex::from_headers(rdr.headers()?)?;
    let mut records = Vec::new();

    for result in rdr.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let cell = |i: usize| row.get(i).unwrap_or("");

        let balance = parse_required(cell(index.balance), line, BALANCE)?;
        records.push(BalanceRecord {
            address: cell(index.address).to_string(),
            balance,
            tokens_in: parse_optional(cell(index.tokens_in), line, TOKENS_IN)?,
            tokens_out: parse_optional(cell(index.tokens_out), line, TOKENS_OUT)?,
            balance_changed: parse_optional(cell(index.balance_changed), line, BALANCE_CHANGED)?,
        });
    }

    let table = BalanceTable::new(records);

    let duplicates = table.duplicate_address_count();
    if duplicates > 0 {
        warn!(duplicates, "balances table has repeated addresses; keeping every row");
    }
    let negatives = table.negative_balance_count();
    if negatives > 0 {
        warn!(negatives, "balances table has negative balances");
    }
    debug!(columns = ?SCHEMA_COLUMNS, rows = table.len(), "parsed balances CSV");

    Ok(table)
}

fn parse_required(raw: &str, line: u64, column: &str) -> Result<f64, LoadError> {
    let invalid = || LoadError::InvalidNumber {
        line,
        column: column.to_string(),
        value: raw.to_string(),
    };
    let value = raw.trim().parse::<f64>().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value)
}

fn parse_optional(raw: &str, line: u64, column: &str) -> Result<Option<f64>, LoadError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = trimmed.parse::<f64>().map_err(|_| LoadError::InvalidNumber {
        line,
        column: column.to_string(),
        value: raw.to_string(),
    })?;
    Ok(value.is_finite().then_some(value))
}

/// Identity of a file version: path, modification time and length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl CacheKey {
    /// Stat `path` and build its current key.
    pub fn probe(path: &Path) -> Result<Self, LoadError> {
        let meta = std::fs::metadata(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

/// Hit/miss counters for the table cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Single-slot cache for the loaded balances table.
///
/// Holds at most one table. A load returns the cached table only when the
/// requested path, its modification time and its length all match the
/// cached key; anything else re-reads the file and replaces the slot.
#[derive(Debug, Default)]
pub struct TableCache {
    slot: Option<(CacheKey, Arc<BalanceTable>)>,
    stats: CacheStats,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path`, reusing the cached table if the file has not changed.
    pub fn load(&mut self, path: &Path) -> Result<Arc<BalanceTable>, LoadError> {
        let key = CacheKey::probe(path)?;

        if let Some((cached_key, table)) = &self.slot {
            if *cached_key == key {
                self.stats.hits += 1;
                debug!(path = %path.display(), "balances cache hit");
                return Ok(Arc::clone(table));
            }
            debug!(path = %path.display(), "balances file changed on disk, reloading");
        }

        self.stats.misses += 1;
        let table = Arc::new(load_table(path)?);
        self.slot = Some((key, Arc::clone(&table)));
        Ok(table)
    }

    /// Key of the cached table, if any.
    pub fn cached_key(&self) -> Option<&CacheKey> {
        self.slot.as_ref().map(|(k, _)| k)
    }

    /// Drop the cached table.
    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
