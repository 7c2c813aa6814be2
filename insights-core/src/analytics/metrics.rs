//! Summary metrics over the full balances table.

use std::collections::HashSet;

use crate::domain::BalanceTable;

/// The two headline numbers of the report, plus the row count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryMetrics {
    /// Sum of `balance` over every row, duplicates included.
    pub total_balance: f64,
    /// Cardinality of the set of addresses.
    pub distinct_addresses: usize,
    pub row_count: usize,
}

impl SummaryMetrics {
    pub fn from_table(table: &BalanceTable) -> Self {
        let total_balance = table.iter().map(|r| r.balance).sum();
        let distinct_addresses = table
            .iter()
            .map(|r| r.address.as_str())
            .collect::<HashSet<_>>()
            .len();
        Self {
            total_balance,
            distinct_addresses,
            row_count: table.len(),
        }
    }
}
