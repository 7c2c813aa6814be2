//! Ranked projections of the balances table.
//!
//! Both sorts are stable: rows that compare equal keep their file order.

use std::cmp::Ordering;

use crate::domain::{BalanceRecord, BalanceTable};

/// Default number of rows in the top-N ranking.
pub const DEFAULT_TOP_N: usize = 20;

/// The `n` records with the largest balance, largest first.
///
/// Returns `min(n, table.len())` records. Equal balances keep input order.
pub fn top_by_balance(table: &BalanceTable, n: usize) -> Vec<&BalanceRecord> {
    let mut ranked: Vec<&BalanceRecord> = table.iter().collect();
    ranked.sort_by(|a, b| compare_desc(a.balance, b.balance));
    ranked.truncate(n);
    ranked
}

/// Every record ordered by `balance_changed` descending, missing values last.
pub fn by_balance_change(table: &BalanceTable) -> Vec<&BalanceRecord> {
    let mut rows: Vec<&BalanceRecord> = table.iter().collect();
    rows.sort_by(|a, b| compare_desc_missing_last(a.balance_changed, b.balance_changed));
    rows
}

/// Descending order where `0.0` and `-0.0` tie. Values are finite after load.
fn compare_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn compare_desc_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => compare_desc(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
