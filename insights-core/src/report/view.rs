//! Report view model.
//!
//! `ReportView` is everything a surface needs to draw the page, computed once
//! from a loaded table: metric cards, one `BarSpec` per ranked row, and the
//! flow table with its gradient colors resolved. The TUI and the HTML
//! generator both render from it and never touch the table directly.

use crate::analytics::{
    bar_label, by_balance_change, format_usd, shorten_address, top_by_balance, SummaryMetrics,
};
use crate::domain::{BalanceRecord, BalanceTable};

use super::palette::{bar_color, GradientScale, Rgb};

/// One bar of the top-N chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSpec {
    /// 0-based rank; also the palette index.
    pub rank: usize,
    pub address: String,
    pub short_address: String,
    pub balance: f64,
    /// `$X.XM` / `$XK`.
    pub label: String,
    pub color: Rgb,
}

impl BarSpec {
    fn from_ranked(rank: usize, record: &BalanceRecord) -> Self {
        Self {
            rank,
            address: record.address.clone(),
            short_address: shorten_address(&record.address),
            balance: record.balance,
            label: bar_label(record.balance),
            color: bar_color(rank),
        }
    }

    /// Hover/detail text: full address and exact balance.
    pub fn detail(&self) -> String {
        format!(
            "Full Address: {}  Balance: {}",
            self.address,
            format_usd(self.balance, 2)
        )
    }
}

/// Resolved colors for one gradient cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellColors {
    pub background: Rgb,
    pub foreground: Rgb,
}

/// One row of the inflow/outflow table.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRow {
    pub address: String,
    pub tokens_in: Option<f64>,
    pub tokens_out: Option<f64>,
    pub balance_changed: Option<f64>,
    /// `None` when `balance_changed` is missing.
    pub change_colors: Option<CellColors>,
}

/// Everything the single-page report shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub metrics: SummaryMetrics,
    pub top_n: usize,
    pub bars: Vec<BarSpec>,
    pub flows: Vec<FlowRow>,
}

impl ReportView {
    pub fn build(table: &BalanceTable, top_n: usize) -> Self {
        let metrics = SummaryMetrics::from_table(table);

        let bars = top_by_balance(table, top_n)
            .into_iter()
            .enumerate()
            .map(|(rank, record)| BarSpec::from_ranked(rank, record))
            .collect();

        let scale = GradientScale::from_values(table.iter().filter_map(|r| r.balance_changed));
        let flows = by_balance_change(table)
            .into_iter()
            .map(|r| FlowRow {
                address: r.address.clone(),
                tokens_in: r.tokens_in,
                tokens_out: r.tokens_out,
                balance_changed: r.balance_changed,
                change_colors: match (scale, r.balance_changed) {
                    (Some(scale), Some(v)) => {
                        let background = scale.color(v);
                        Some(CellColors {
                            background,
                            foreground: background.contrast_text(),
                        })
                    }
                    _ => None,
                },
            })
            .collect();

        Self {
            metrics,
            top_n,
            bars,
            flows,
        }
    }

    /// Tallest bar, used to scale the chart axis. Zero when there are no
    /// positive balances.
    pub fn max_bar_balance(&self) -> f64 {
        self.bars.iter().map(|b| b.balance).fold(0.0, f64::max)
    }

    pub fn total_balance_display(&self) -> String {
        format_usd(self.metrics.total_balance, 2)
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.row_count == 0
    }
}
