//! Celo Insights core: the balance data pipeline behind the `insights` CLI and
//! the `insights-tui` report.
//!
//! - Domain types (balance records, the loaded table)
//! - Dune query provider and the fetch stage with its metadata sidecar
//! - JSON-to-CSV conversion of tabular query results
//! - CSV loading behind a single-slot, staleness-aware cache
//! - Analytics: summary metrics, top-N ranking, display formatting
//! - Report views, CSV downloads, and the static HTML page

pub mod analytics;
pub mod config;
pub mod data;
pub mod domain;
pub mod logging;
pub mod report;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the types the TUI keeps in its state are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::BalanceRecord>();
        require_sync::<domain::BalanceRecord>();
        require_send::<domain::BalanceTable>();
        require_sync::<domain::BalanceTable>();

        require_send::<config::InsightsConfig>();
        require_sync::<config::InsightsConfig>();

        require_send::<data::TableCache>();
        require_sync::<data::TableCache>();
        require_send::<data::FetchMeta>();
        require_sync::<data::FetchMeta>();

        require_send::<report::ReportView>();
        require_sync::<report::ReportView>();
    }

    #[test]
    fn modules_are_reachable() {
        let table = domain::BalanceTable::default();
        let view = report::ReportView::build(&table, analytics::DEFAULT_TOP_N);
        assert_eq!(view.top_n, 20);
    }
}
