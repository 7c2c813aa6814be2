//! Read-only projections over the balances table.

pub mod format;
pub mod metrics;
pub mod ranking;

pub use format::{bar_label, format_count, format_number, format_usd, shorten_address};
pub use metrics::SummaryMetrics;
pub use ranking::{by_balance_change, top_by_balance, DEFAULT_TOP_N};
