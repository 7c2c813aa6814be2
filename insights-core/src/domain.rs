//! Domain types: balance records and the in-memory balance table.
//!
//! The table is the unit every report projection works from. It is built
//! once by the loader and never mutated afterwards; rankings and flow views
//! borrow from it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Column names of the balances artifact, in file order.
pub const ADDRESS: &str = "address";
pub const BALANCE: &str = "balance";
pub const TOKENS_IN: &str = "tokens_in";
pub const TOKENS_OUT: &str = "tokens_out";
pub const BALANCE_CHANGED: &str = "balance_changed";

/// Full artifact schema.
pub const SCHEMA_COLUMNS: [&str; 5] = [ADDRESS, BALANCE, TOKENS_IN, TOKENS_OUT, BALANCE_CHANGED];

/// One row of balance data, keyed by address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub address: String,
    pub balance: f64,
    pub tokens_in: Option<f64>,
    pub tokens_out: Option<f64>,
    pub balance_changed: Option<f64>,
}

impl BalanceRecord {
    /// Record with a balance and no flow data.
    pub fn new(address: impl Into<String>, balance: f64) -> Self {
        Self {
            address: address.into(),
            balance,
            tokens_in: None,
            tokens_out: None,
            balance_changed: None,
        }
    }

    /// Attach inflow/outflow/net-change values.
    pub fn with_flows(mut self, tokens_in: f64, tokens_out: f64, balance_changed: f64) -> Self {
        self.tokens_in = Some(tokens_in);
        self.tokens_out = Some(tokens_out);
        self.balance_changed = Some(balance_changed);
        self
    }
}

/// Ordered, read-only set of balance records in artifact order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceTable {
    records: Vec<BalanceRecord>,
}

impl BalanceTable {
    pub fn new(records: Vec<BalanceRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[BalanceRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BalanceRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of rows whose address already appeared earlier in the table.
    pub fn duplicate_address_count(&self) -> usize {
        let mut seen = HashSet::with_capacity(self.records.len());
        self.records
            .iter()
            .filter(|r| !seen.insert(r.address.as_str()))
            .count()
    }

    /// Number of rows with a negative balance.
    pub fn negative_balance_count(&self) -> usize {
        self.records.iter().filter(|r| r.balance < 0.0).count()
    }
}

impl FromIterator<BalanceRecord> for BalanceTable {
    fn from_iter<I: IntoIterator<Item = BalanceRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a BalanceTable {
    type Item = &'a BalanceRecord;
    type IntoIter = std::slice::Iter<'a, BalanceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
