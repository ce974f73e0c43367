//! Backtest report: aggregates terminal deal history over a date window,
//! prints a summary and exports the full JSON document.
//!
//! ```sh
//! MODE=csv cargo run --bin report -- --from 2024-01-01 --to 2024-06-30 --history-dir ./history
//! ```

use anyhow::Context;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::Parser;
use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use termbridge::application::backtest::{BacktestBridge, ReportDocument, locate_compiled_advisor};
use termbridge::config::{HistoryEnvConfig, LogFormat, Mode};
use termbridge::domain::ports::HistoryFeed;
use termbridge::infrastructure::observability::init_logging;
use termbridge::infrastructure::CsvHistoryFeed;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Start date (YYYY-MM-DD), inclusive
    #[arg(long, default_value = "2024-01-01")]
    from: String,

    /// End date (YYYY-MM-DD), exclusive. Defaults to now.
    #[arg(long)]
    to: Option<String>,

    /// Output file for the JSON report
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory with deals.csv / orders.csv (csv mode)
    #[arg(long)]
    history_dir: Option<PathBuf>,

    /// Data source, overrides MODE (only `csv` carries history)
    #[arg(long)]
    mode: Option<String>,

    /// Expert Advisor source (.mq5) to check for a compiled build
    #[arg(long)]
    advisor: Option<PathBuf>,
}

fn parse_day(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))?;
    Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)))
}

fn print_summary(document: &ReportDocument) {
    let (trades, win_rate, net, drawdown, factor) = match document.report() {
        Some(r) => (
            r.total_trades,
            r.win_rate,
            r.net_profit,
            r.max_drawdown,
            r.profit_factor,
        ),
        None => (0, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
    };

    println!("\n=== BACKTEST RESULTS ===");
    println!("Total Trades: {}", trades);
    println!("Win Rate: {}%", win_rate);
    println!("Net Profit: ${}", net);
    println!("Max Drawdown: ${}", drawdown);
    println!("Profit Factor: {}", factor);
    if let ReportDocument::Error { error } = document {
        println!("Note: {}", error);
    }
}

/// `--mode` wins; `MODE` is only read when the flag is absent.
fn resolve_mode(flag: Option<&str>, env_mode: Option<&str>) -> anyhow::Result<Mode> {
    match flag.or(env_mode) {
        Some(name) => Mode::from_str(name),
        None => Ok(Mode::Csv),
    }
}

/// Reports need recorded history, which only the CSV export provides.
fn history_feed(mode: Mode, dir: PathBuf) -> anyhow::Result<Arc<dyn HistoryFeed>> {
    match mode {
        Mode::Csv => {
            info!("Reading history from {}", dir.display());
            Ok(Arc::new(CsvHistoryFeed::new(dir)))
        }
        Mode::Mock => anyhow::bail!(
            "Mock mode has no recorded deal history to report on; run with --mode csv"
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(LogFormat::from_env());

    let env_mode = env::var("MODE").ok();
    let mode = resolve_mode(cli.mode.as_deref(), env_mode.as_deref())?;
    let history = HistoryEnvConfig::from_env();

    let from = parse_day(&cli.from)?;
    let to = match &cli.to {
        Some(day) => parse_day(day)?,
        None => Utc::now(),
    };
    if to <= from {
        anyhow::bail!("--to must be after --from");
    }
    let output = cli.output.unwrap_or(history.report_output);

    if let Some(source) = &cli.advisor {
        match locate_compiled_advisor(source) {
            Ok(compiled) => info!("Compiled advisor: {}", compiled.display()),
            Err(e) => warn!("{}: {}", source.display(), e),
        }
    }

    let feed = history_feed(mode, cli.history_dir.unwrap_or(history.history_dir))?;

    info!("Analyzing deals from {} to {}", from, to);
    let bridge = BacktestBridge::new(feed);
    let document = bridge.export_report(from, to, &output).await?;

    print_summary(&document);
    Ok(())
}
