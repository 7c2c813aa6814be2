//! End-to-end pipeline: JSON query result → CSV artifact → table → report.
//!
//! Uses the frozen Dune-shaped fixture in `tests/fixtures/celo_balances.json`.

use std::path::PathBuf;

use insights_core::analytics::{top_by_balance, SummaryMetrics};
use insights_core::config::ReportConfig;
use insights_core::data::fetch::{meta_path, read_meta};
use insights_core::data::{
    convert_file, fetch_to_file, load_table, DataError, QueryOutput, QueryProvider, QueryRequest,
    ResultFormat,
};
use insights_core::domain::{BalanceRecord, BalanceTable};
use insights_core::report::{
    export_all, full_table_csv, rd_yl_gn, HtmlReportGenerator, ReportView, BAR_PALETTE,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

// ── Converter → loader ───────────────────────────────────────────────

#[test]
fn converted_fixture_loads_every_row() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("data/celo_balances.csv");

    let converted = convert_file(&fixture("celo_balances.json"), &csv_path).unwrap();
    assert_eq!(converted.rows, 4);
    assert_eq!(
        converted.columns,
        ["address", "balance", "tokens_in", "tokens_out", "balance_changed"]
    );

    let table = load_table(&csv_path).unwrap();
    assert_eq!(table.len(), 4);

    let first = &table.records()[0];
    assert_eq!(first.address, "0x765de816845861e75a25fca122bb6898b8b1282a");
    assert_eq!(first.balance, 2_450_000.5);
    assert_eq!(first.tokens_in, Some(3_100_000.0));
    assert_eq!(first.tokens_out, Some(649_999.5));

    // null cells round-trip as missing values
    let last = &table.records()[3];
    assert_eq!(last.balance, 640_000.0);
    assert_eq!(last.tokens_in, None);
    assert_eq!(last.balance_changed, None);
}

#[test]
fn fixture_report_view() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("celo_balances.csv");
    convert_file(&fixture("celo_balances.json"), &csv_path).unwrap();
    let table = load_table(&csv_path).unwrap();

    let view = ReportView::build(&table, 20);
    assert_eq!(view.metrics.distinct_addresses, 4);
    assert_eq!(view.total_balance_display(), "$3,176,200.75");

    let labels: Vec<&str> = view.bars.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, ["$2.5M", "$640K", "$85K", "$1K"]);
    assert_eq!(view.bars[0].short_address, "0x765d...282a");
    assert_eq!(view.bars[3].color, BAR_PALETTE[3]);

    let changes: Vec<Option<f64>> = view.flows.iter().map(|f| f.balance_changed).collect();
    assert_eq!(
        changes,
        [Some(2_450_000.5), Some(85_000.0), Some(-800.75), None]
    );
    assert_eq!(
        view.flows[0].change_colors.unwrap().background,
        rd_yl_gn(1.0)
    );
    assert_eq!(
        view.flows[2].change_colors.unwrap().background,
        rd_yl_gn(0.0)
    );
}

// ── Reference example ────────────────────────────────────────────────

#[test]
fn three_row_example() {
    let table = BalanceTable::new(vec![
        BalanceRecord::new("A", 100.0),
        BalanceRecord::new("B", 50.0),
        BalanceRecord::new("C", 300.0),
    ]);

    let ranked: Vec<&str> = top_by_balance(&table, 20)
        .iter()
        .map(|r| r.address.as_str())
        .collect();
    assert_eq!(ranked, ["C", "A", "B"]);

    let metrics = SummaryMetrics::from_table(&table);
    assert_eq!(metrics.total_balance, 450.0);
    assert_eq!(metrics.distinct_addresses, 3);
}

// ── Export round trip ────────────────────────────────────────────────

#[test]
fn exports_reload_to_the_same_table() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("celo_balances.csv");
    convert_file(&fixture("celo_balances.json"), &csv_path).unwrap();
    let table = load_table(&csv_path).unwrap();

    let paths = export_all(&table, 2, &dir.path().join("exports"), &csv_path).unwrap();
    assert!(paths.top.ends_with("top2_celo_balances.csv"));

    let reloaded = load_table(&paths.full).unwrap();
    assert_eq!(reloaded, table);

    let top = std::fs::read_to_string(&paths.top).unwrap();
    let lines: Vec<&str> = top.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "address,balance");
    assert!(lines[1].starts_with("0x765de816845861e75a25fca122bb6898b8b1282a,"));
    assert!(lines[2].starts_with("0xe8537a3d056da446677b9e9d6c5db704eaab4787,"));

    assert_eq!(full_table_csv(&reloaded).unwrap(), full_table_csv(&table).unwrap());
}

#[test]
fn html_report_from_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("celo_balances.csv");
    convert_file(&fixture("celo_balances.json"), &csv_path).unwrap();
    let table = load_table(&csv_path).unwrap();
    let view = ReportView::build(&table, 20);

    let html_path = dir.path().join("report/index.html");
    HtmlReportGenerator::new(&ReportConfig::default())
        .write_to(&html_path, &table, &view)
        .unwrap();
    let html = std::fs::read_to_string(&html_path).unwrap();
    assert!(html.contains("$3,176,200.75"));
    assert_eq!(html.matches("<rect ").count(), 4);
}

// ── Fetch with a canned provider ─────────────────────────────────────

struct CannedProvider;

impl QueryProvider for CannedProvider {
    fn name(&self) -> &str {
        "canned"
    }

    fn run_query(
        &self,
        request: &QueryRequest,
        format: ResultFormat,
    ) -> Result<QueryOutput, DataError> {
        let body = match format {
            ResultFormat::Csv => "address,balance,tokens_in,tokens_out,balance_changed\n\
0xabc0000000,10,1,0,1\n0xdef0000000,20,,,\n"
                .to_string(),
            ResultFormat::Json => std::fs::read_to_string(fixture("celo_balances.json"))
                .map_err(|e| DataError::Client(e.to_string()))?,
        };
        Ok(QueryOutput {
            execution_id: format!("exec-{}", request.query_id),
            format,
            body,
        })
    }
}

#[test]
fn fetched_csv_is_loadable_and_has_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("data/stablecoin_cusd.csv");
    let request = QueryRequest::new(5_354_328, "Any Name");

    let summary = fetch_to_file(&CannedProvider, &request, ResultFormat::Csv, &dest).unwrap();
    assert_eq!(summary.meta.rows, Some(2));
    assert_eq!(summary.meta.execution_id, "exec-5354328");
    assert_eq!(summary.meta_path, meta_path(&dest));

    let meta = read_meta(&dest).unwrap();
    assert_eq!(meta, summary.meta);

    let table = load_table(&dest).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.records()[1].tokens_in, None);
}

#[test]
fn fetched_json_feeds_the_converter() {
    let dir = tempfile::tempdir().unwrap();
    let json_dest = dir.path().join("data/celo_balances.json");
    let csv_dest = dir.path().join("data/celo_balances.csv");
    let request = QueryRequest::new(1, "json");

    fetch_to_file(&CannedProvider, &request, ResultFormat::Json, &json_dest).unwrap();
    let converted = convert_file(&json_dest, &csv_dest).unwrap();
    assert_eq!(converted.rows, 4);
    assert_eq!(load_table(&csv_dest).unwrap().len(), 4);
}
