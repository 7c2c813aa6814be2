//! Celo Insights CLI: fetch, convert, and report commands.
//!
//! Commands:
//! - `fetch`: run a Dune query and save the result (CSV or JSON) with a metadata sidecar
//! - `convert`: turn a JSON query result into the balances CSV
//! - `report`: load the balances CSV, print the summary, optionally write the HTML page
//! - `export`: write the top-N and full-table CSV downloads
//! - `summary`: print metrics and the top-N ranking

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use insights_core::analytics::{format_count, format_usd};
use insights_core::config::{parse_params, InsightsConfig};
use insights_core::data::{
    convert_file, fetch_to_file, read_meta, DuneProvider, FetchMeta, QueryRequest, ResultFormat,
    TableCache,
};
use insights_core::logging::init_logging;
use insights_core::report::{export_all, HtmlReportGenerator, ReportView};

const DEFAULT_LOG_DIRECTIVES: &str = "warn,insights_core=info,insights=info";

#[derive(Parser)]
#[command(
    name = "insights",
    version,
    about = "Celo Insights: fetch, convert and report cUSD balance data"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to ./insights.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Dune query and save the result to disk.
    Fetch {
        /// Query ID. Defaults to fetch.query_id from the config.
        #[arg(long)]
        query_id: Option<u64>,

        /// Query name recorded in the sidecar.
        #[arg(long)]
        name: Option<String>,

        /// Query parameter as key=value (repeatable).
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Result format to download.
        #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
        format: FormatArg,

        /// Output file. Defaults to paths.fetch_output (CSV) or paths.balances_json (JSON).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Convert a JSON query result into the balances CSV.
    Convert {
        /// Input JSON. Defaults to paths.balances_json.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output CSV. Defaults to paths.balances_csv.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the report summary and optionally write the HTML page.
    Report {
        /// Balances CSV. Defaults to paths.balances_csv.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Write a self-contained HTML report to this path.
        #[arg(long)]
        html: Option<PathBuf>,

        /// Number of ranked addresses. Defaults to report.top_n.
        #[arg(long)]
        top: Option<NonZeroUsize>,
    },
    /// Write the top-N and full-table CSV downloads.
    Export {
        /// Balances CSV. Defaults to paths.balances_csv.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output directory. Defaults to paths.export_dir.
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Number of ranked addresses. Defaults to report.top_n.
        #[arg(long)]
        top: Option<NonZeroUsize>,
    },
    /// Print summary metrics and the top-N ranking.
    Summary {
        /// Balances CSV. Defaults to paths.balances_csv.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Number of ranked addresses. Defaults to report.top_n.
        #[arg(long)]
        top: Option<NonZeroUsize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ResultFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ResultFormat::Csv,
            FormatArg::Json => ResultFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(DEFAULT_LOG_DIRECTIVES)?;

    let config = InsightsConfig::load(cli.config.as_deref()).context("failed to load config")?;
    debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Fetch {
            query_id,
            name,
            params,
            format,
            out,
        } => run_fetch(&config, query_id, name, &params, format.into(), out),
        Commands::Convert { input, output } => {
            let input = input.unwrap_or_else(|| config.paths.balances_json.clone());
            let output = output.unwrap_or_else(|| config.paths.balances_csv.clone());
            run_convert(&input, &output)
        }
        Commands::Report { input, html, top } => {
            let input = input.unwrap_or_else(|| config.paths.balances_csv.clone());
            let top_n = top.map_or(config.report.top_n, NonZeroUsize::get);
            run_report(&config, &input, html.as_deref(), top_n)
        }
        Commands::Export {
            input,
            out_dir,
            top,
        } => {
            let input = input.unwrap_or_else(|| config.paths.balances_csv.clone());
            let out_dir = out_dir.unwrap_or_else(|| config.paths.export_dir.clone());
            let top_n = top.map_or(config.report.top_n, NonZeroUsize::get);
            run_export(&input, &out_dir, top_n)
        }
        Commands::Summary { input, top } => {
            let input = input.unwrap_or_else(|| config.paths.balances_csv.clone());
            let top_n = top.map_or(config.report.top_n, NonZeroUsize::get);
            run_summary(&config, &input, top_n)
        }
    }
}

fn run_fetch(
    config: &InsightsConfig,
    query_id: Option<u64>,
    name: Option<String>,
    params: &[String],
    format: ResultFormat,
    out: Option<PathBuf>,
) -> Result<()> {
    // CLI parameters override config ones with the same key.
    let mut merged = config.fetch.params.clone();
    merged.extend(parse_params(params)?);

    let request = QueryRequest::new(
        query_id.unwrap_or(config.fetch.query_id),
        name.unwrap_or_else(|| config.fetch.query_name.clone()),
    )
    .with_params(merged);

    let dest = out.unwrap_or_else(|| match format {
        ResultFormat::Csv => config.paths.fetch_output.clone(),
        ResultFormat::Json => config.paths.balances_json.clone(),
    });

    let provider = DuneProvider::from_env(Duration::from_secs(config.fetch.poll_interval_secs))
        .context("failed to set up the Dune provider")?;

    let summary = fetch_to_file(&provider, &request, format, &dest)
        .with_context(|| format!("query {} failed", request.query_id))?;

    println!(
        "{} saved to {}",
        format.label().to_uppercase(),
        summary.artifact.display()
    );
    println!("Metadata:  {}", summary.meta_path.display());
    if let Some(rows) = summary.meta.rows {
        println!("Rows:      {}", format_count(rows));
    }
    Ok(())
}

fn run_convert(input: &Path, output: &Path) -> Result<()> {
    let converted = convert_file(input, output)
        .with_context(|| format!("failed to convert {}", input.display()))?;
    println!("CSV saved to {}", output.display());
    debug!(rows = converted.rows, "conversion complete");
    Ok(())
}

fn run_report(
    config: &InsightsConfig,
    input: &Path,
    html: Option<&Path>,
    top_n: usize,
) -> Result<()> {
    let mut cache = TableCache::new();
    let table = cache
        .load(input)
        .with_context(|| format!("failed to load {}", input.display()))?;
    let view = ReportView::build(&table, top_n);

    print_summary(config, &view);

    if let Some(path) = html {
        let bytes = HtmlReportGenerator::new(&config.report)
            .write_to(path, &table, &view)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("HTML report saved to {} ({bytes} bytes)", path.display());
    }
    Ok(())
}

fn run_export(input: &Path, out_dir: &Path, top_n: usize) -> Result<()> {
    let mut cache = TableCache::new();
    let table = cache
        .load(input)
        .with_context(|| format!("failed to load {}", input.display()))?;
    let paths = export_all(&table, top_n, out_dir, input)
        .with_context(|| format!("failed to export to {}", out_dir.display()))?;
    println!("CSV saved to {}", paths.top.display());
    println!("CSV saved to {}", paths.full.display());
    Ok(())
}

fn run_summary(config: &InsightsConfig, input: &Path, top_n: usize) -> Result<()> {
    let mut cache = TableCache::new();
    let table = cache
        .load(input)
        .with_context(|| format!("failed to load {}", input.display()))?;
    print_summary(config, &ReportView::build(&table, top_n));
    if let Some(meta) = read_meta(input) {
        print_fetch_meta(&meta);
    }
    Ok(())
}

fn print_fetch_meta(meta: &FetchMeta) {
    println!("--- Source ---");
    println!("Query:      {} ({})", meta.query_name, meta.query_id);
    println!("Execution:  {} via {}", meta.execution_id, meta.provider);
    println!("Fetched at: {}", meta.fetched_at.format("%Y-%m-%d %H:%M:%S"));
    match meta.rows {
        Some(rows) => println!("Payload:    {} rows, {} bytes", format_count(rows), meta.bytes),
        None => println!("Payload:    {} bytes", meta.bytes),
    }
    println!("BLAKE3:     {}", meta.data_hash);
    println!();
}

fn print_summary(config: &InsightsConfig, view: &ReportView) {
    let symbol = &config.report.token_symbol;
    println!();
    println!("=== {} ===", config.report.title);
    println!(
        "Total {symbol} Balance: {}",
        format_usd(view.metrics.total_balance, 2)
    );
    println!(
        "Tracked Addresses:   {}",
        format_count(view.metrics.distinct_addresses)
    );
    if view.metrics.row_count != view.metrics.distinct_addresses {
        println!(
            "Rows:                {} (some addresses repeat)",
            format_count(view.metrics.row_count)
        );
    }
    println!();

    if view.is_empty() {
        println!("No balances to rank.");
        println!();
        return;
    }

    println!("--- Top {} Addresses by Balance ---", view.top_n);
    println!("{:>4}  {:<44} {:>20} {:>8}", "#", "Address", "Balance", "Label");
    println!("{}", "-".repeat(80));
    for bar in &view.bars {
        println!(
            "{:>4}  {:<44} {:>20} {:>8}",
            bar.rank + 1,
            bar.address,
            format_usd(bar.balance, 2),
            bar.label
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fetch_collects_repeated_params() {
        let cli = Cli::try_parse_from([
            "insights", "fetch", "--param", "chain=celo", "--param", "limit=10", "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Fetch { params, format, .. } => {
                assert_eq!(params, ["chain=celo", "limit=10"]);
                assert_eq!(format, FormatArg::Json);
            }
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli =
            Cli::try_parse_from(["insights", "summary", "--config", "alt.toml", "--top", "5"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        match cli.command {
            Commands::Summary { top, .. } => assert_eq!(top.map(NonZeroUsize::get), Some(5)),
            _ => panic!("expected summary"),
        }
    }

    #[test]
    fn zero_top_is_rejected() {
        for cmd in ["report", "export", "summary"] {
            assert!(Cli::try_parse_from(["insights", cmd, "--top", "0"]).is_err());
        }
        assert!(Cli::try_parse_from(["insights", "export", "--top", "1"]).is_ok());
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["insights", "fetch", "--format", "xml"]).is_err());
    }
}
