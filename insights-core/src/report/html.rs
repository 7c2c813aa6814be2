//! Self-contained HTML report.
//!
//! One page, no external assets: metric cards, an inline SVG bar chart with
//! per-bar `<title>` hover text, the gradient-colored flow table, and the two
//! CSV downloads embedded as `data:` URIs.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::analytics::{format_count, format_number, format_usd};
use crate::config::ReportConfig;
use crate::data::fetch::write_atomic;
use crate::domain::BalanceTable;

use super::export::{full_table_csv, top_export_filename, top_n_csv, ExportError, FULL_EXPORT_FILENAME};
use super::view::{BarSpec, FlowRow, ReportView};

// Chart geometry, in SVG user units.
const CHART_WIDTH: f64 = 1000.0;
const CHART_HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 80.0;
const MARGIN_BOTTOM: f64 = 120.0;
const Y_TICKS: usize = 5;

const AXIS_TEXT: &str = "#6b7280";
const TITLE_TEXT: &str = "#374151";
const GRID_LINE: &str = "#f3f4f6";

pub struct HtmlReportGenerator {
    title: String,
    subtitle: String,
    token_symbol: String,
    data_source: String,
}

impl HtmlReportGenerator {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            token_symbol: config.token_symbol.clone(),
            data_source: config.data_source.clone(),
        }
    }

    pub fn generate(&self, table: &BalanceTable, view: &ReportView) -> Result<String, ExportError> {
        let top_csv = top_n_csv(table, view.top_n)?;
        let full_csv = full_table_csv(table)?;
        let symbol = escape(&self.token_symbol);

        let mut html = format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
<meta charset=\"utf-8\">\n\
<title>{title}</title>\n\
<style>{STYLE}</style>\n\
</head>\n<body>\n",
            title = escape(&self.title),
        );

        html.push_str(&format!(
            "<aside class=\"sidebar\">\n<h2>About</h2>\n\
<div class=\"info\"><p>{} Dashboard</p><p>Data source: {}</p><p>Built with Rust.</p></div>\n\
</aside>\n<main>\n",
            escape(&self.title),
            escape(&self.data_source),
        ));

        html.push_str(&format!(
            "<h1>{}</h1>\n<p class=\"subtitle\">{}</p>\n",
            escape(&self.title),
            escape(&self.subtitle)
        ));

        // Metric cards
        html.push_str("<section class=\"metrics\">\n");
        html.push_str(&metric_card(
            &format!("Total {symbol} Balance"),
            &format_usd(view.metrics.total_balance, 2),
        ));
        html.push_str(&metric_card(
            "Tracked Addresses",
            &format_count(view.metrics.distinct_addresses),
        ));
        html.push_str("</section>\n<hr>\n");

        // Chart
        html.push_str(&format!(
            "<h2>Top {} Addresses by Balance</h2>\n",
            view.top_n
        ));
        html.push_str(&render_chart(view, &symbol));

        html.push_str(&format!(
            "<details>\n<summary>Show Top {} Table</summary>\n",
            view.top_n
        ));
        html.push_str(&render_top_table(&view.bars));
        html.push_str("</details>\n");
        html.push_str(&download_link(
            &format!("Download Top {} as CSV", view.top_n),
            &top_export_filename(view.top_n),
            &top_csv,
        ));
        html.push_str("<hr>\n");

        // Flows
        html.push_str("<h2>Token Inflows and Outflows</h2>\n");
        html.push_str(&render_flow_table(&view.flows));
        html.push_str(&download_link(
            "Download Data as CSV",
            FULL_EXPORT_FILENAME,
            &full_csv,
        ));

        html.push_str("</main>\n</body>\n</html>\n");
        Ok(html)
    }

    /// Render and write the page to `path`, creating parent directories.
    pub fn write_to(
        &self,
        path: &Path,
        table: &BalanceTable,
        view: &ReportView,
    ) -> Result<usize, ExportError> {
        let html = self.generate(table, view)?;
        write_atomic(path, html.as_bytes())?;
        Ok(html.len())
    }
}

const STYLE: &str = "body{margin:0;display:flex;font-family:Arial,sans-serif;color:#111827}\
.sidebar{width:240px;padding:24px;background:#f0f2f6}\
.info{background:#dbeafe;color:#1e3a8a;padding:12px;border-radius:6px}\
main{flex:1;padding:24px 48px}\
.subtitle{color:#4b5563}\
.metrics{display:flex;gap:48px}\
.metric .label{font-size:14px;color:#4b5563}\
.metric .value{font-size:32px}\
table{border-collapse:collapse;font-size:13px}\
th,td{padding:4px 10px;border-bottom:1px solid #e5e7eb;text-align:right}\
th:first-child,td:first-child{text-align:left;font-family:monospace}\
a.download{display:inline-block;margin:12px 0;padding:6px 12px;border:1px solid #d1d5db;border-radius:6px;text-decoration:none;color:#111827}";

fn metric_card(label: &str, value: &str) -> String {
    format!(
        "<div class=\"metric\"><div class=\"label\">{label}</div><div class=\"value\">{}</div></div>\n",
        escape(value)
    )
}

fn download_link(text: &str, filename: &str, csv: &str) -> String {
    format!(
        "<p><a class=\"download\" download=\"{}\" href=\"data:text/csv;base64,{}\">{}</a></p>\n",
        escape(filename),
        STANDARD.encode(csv.as_bytes()),
        escape(text)
    )
}

fn render_top_table(bars: &[BarSpec]) -> String {
    let mut out = String::from("<table>\n<tr><th>address</th><th>balance</th></tr>\n");
    for bar in bars {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape(&bar.address),
            format_number(bar.balance, 2)
        ));
    }
    out.push_str("</table>\n");
    out
}

fn render_flow_table(rows: &[FlowRow]) -> String {
    let mut out = String::from(
        "<table>\n<tr><th>address</th><th>tokens_in</th><th>tokens_out</th><th>balance_changed</th></tr>\n",
    );
    for row in rows {
        let change_style = row
            .change_colors
            .map(|c| {
                format!(
                    " style=\"background-color:{};color:{}\"",
                    c.background.hex(),
                    c.foreground.hex()
                )
            })
            .unwrap_or_default();
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td{}>{}</td></tr>\n",
            escape(&row.address),
            optional_number(row.tokens_in),
            optional_number(row.tokens_out),
            change_style,
            optional_number(row.balance_changed)
        ));
    }
    out.push_str("</table>\n");
    out
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|v| format_number(v, 2)).unwrap_or_default()
}

/// Vertical axis range and tick step covering every bar and zero.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisRange {
    min: f64,
    max: f64,
    step: f64,
}

impl AxisRange {
    fn for_values(values: impl Iterator<Item = f64>) -> Self {
        let (lo, hi) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let span = hi - lo;
        if span <= 0.0 {
            return Self {
                min: 0.0,
                max: 1.0,
                step: 0.2,
            };
        }
        let step = nice_step(span / Y_TICKS as f64);
        Self {
            min: (lo / step).floor() * step,
            max: (hi / step).ceil() * step,
            step,
        }
    }

    fn ticks(&self) -> Vec<f64> {
        let count = ((self.max - self.min) / self.step).round() as usize;
        (0..=count).map(|i| self.min + self.step * i as f64).collect()
    }
}

/// Smallest 1/2/5 × 10^k at or above `raw`.
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn render_chart(view: &ReportView, symbol: &str) -> String {
    let plot_w = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let axis = AxisRange::for_values(view.bars.iter().map(|b| b.balance));
    let y_of = |v: f64| MARGIN_TOP + plot_h * (axis.max - v) / (axis.max - axis.min);

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {CHART_WIDTH} {CHART_HEIGHT}\" \
width=\"100%\" font-family=\"Arial, sans-serif\" style=\"background:white\">\n"
    );

    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"40\" font-size=\"16\" fill=\"{TITLE_TEXT}\">Top {} Addresses by {symbol} Balance</text>\n",
        CHART_WIDTH * 0.02,
        view.top_n
    ));

    for tick in axis.ticks() {
        let y = y_of(tick);
        svg.push_str(&format!(
            "<line x1=\"{MARGIN_LEFT}\" x2=\"{:.1}\" y1=\"{y:.1}\" y2=\"{y:.1}\" stroke=\"{GRID_LINE}\" stroke-width=\"1\"/>\n",
            MARGIN_LEFT + plot_w
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" fill=\"{AXIS_TEXT}\" text-anchor=\"end\">{}</text>\n",
            MARGIN_LEFT - 6.0,
            y + 3.0,
            format_usd(tick, 0)
        ));
    }

    if !view.bars.is_empty() {
        let band = plot_w / view.bars.len() as f64;
        let bar_w = band * 0.8;
        let zero_y = y_of(0.0);
        for (i, bar) in view.bars.iter().enumerate() {
            let x = MARGIN_LEFT + band * i as f64 + (band - bar_w) / 2.0;
            let value_y = y_of(bar.balance);
            let (top, height) = if value_y <= zero_y {
                (value_y, zero_y - value_y)
            } else {
                (zero_y, value_y - zero_y)
            };
            let cx = x + bar_w / 2.0;
            svg.push_str(&format!(
                "<g><title>Full Address: {}\nBalance: {}</title>\
<rect x=\"{x:.1}\" y=\"{top:.1}\" width=\"{bar_w:.1}\" height=\"{height:.1}\" fill=\"{}\"/>\
<text x=\"{cx:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"black\" text-anchor=\"middle\">{}</text></g>\n",
                escape(&bar.address),
                format_usd(bar.balance, 2),
                bar.color.hex(),
                top - 4.0,
                escape(&bar.label),
            ));
            let label_y = MARGIN_TOP + plot_h + 12.0;
            svg.push_str(&format!(
                "<text x=\"{cx:.1}\" y=\"{label_y:.1}\" font-size=\"10\" fill=\"{AXIS_TEXT}\" text-anchor=\"end\" \
transform=\"rotate(-45 {cx:.1} {label_y:.1})\">{}</text>\n",
                escape(&bar.short_address)
            ));
        }
    }

    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" fill=\"{AXIS_TEXT}\" text-anchor=\"middle\">Address</text>\n",
        MARGIN_LEFT + plot_w / 2.0,
        CHART_HEIGHT - 10.0
    ));
    let mid_y = MARGIN_TOP + plot_h / 2.0;
    svg.push_str(&format!(
        "<text x=\"16\" y=\"{mid_y:.1}\" font-size=\"12\" fill=\"{AXIS_TEXT}\" text-anchor=\"middle\" \
transform=\"rotate(-90 16 {mid_y:.1})\">Balance ({symbol})</text>\n"
    ));
    svg.push_str("</svg>\n");
    svg
}

/// Minimal HTML escaping for text and attribute values.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
