//! ticker-report: derive technical, valuation and ownership views for tickers
//! stored as JSON fixtures and print them as JSON.
//!
//! Usage:
//!   cargo run -p ticker-report -- --data-dir crates/ticker-report/data --symbols DEMO
//!   cargo run -p ticker-report -- --data-dir ./data --symbols AAPL MSFT
//!   cargo run -p ticker-report -- --symbols AAPL --as-of 2024-06-28 --timeframe 1wk
//!   cargo run -p ticker-report -- --symbols AAPL --summary

use analysis_core::format::{format_currency, format_signed_pct};
use analysis_core::{parse_session_date, AnalysisConfig, Timeframe};
use analysis_orchestrator::{AnalysisOrchestrator, TickerReport};
use anyhow::{bail, Context, Result};
use chrono::Utc;

mod file_source;

use file_source::JsonFileSource;

const DEFAULT_DATA_DIR: &str = "data";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let summary_only = args.iter().any(|a| a == "--summary");

    let data_dir = flag_value(&args, "--data-dir")
        .map(|s| s.to_string())
        .or_else(|| std::env::var("TICKER_DATA_DIR").ok())
        .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

    let as_of = match flag_value(&args, "--as-of") {
        Some(raw) => parse_session_date(raw).with_context(|| format!("invalid --as-of {raw:?}"))?,
        None => Utc::now().date_naive(),
    };

    let timeframe = match flag_value(&args, "--timeframe").unwrap_or("1d") {
        "1d" => Timeframe::Day1,
        "1wk" => Timeframe::Week1,
        "1mo" => Timeframe::Month1,
        other => bail!("unknown --timeframe {other:?} (expected 1d, 1wk or 1mo)"),
    };

    let symbols: Vec<String> = match args.iter().position(|a| a == "--symbols") {
        Some(idx) => args[idx + 1..]
            .iter()
            .take_while(|a| !a.starts_with("--"))
            .map(|s| s.to_uppercase())
            .collect(),
        None => Vec::new(),
    };
    if symbols.is_empty() {
        bail!("no symbols given (use --symbols AAPL MSFT ...)");
    }

    let config = AnalysisConfig::from_env().context("loading analysis configuration")?;
    tracing::info!(
        "Configuration: RSI({}), MACD({}, {}, {}), {} DCF scenarios, P/E multiples {:?}",
        config.indicators.rsi_period,
        config.indicators.macd_fast,
        config.indicators.macd_slow,
        config.indicators.macd_signal,
        config.scenarios.len(),
        config.pe_band_multiples
    );

    let orchestrator = AnalysisOrchestrator::new(JsonFileSource::new(&data_dir), config).with_timeframe(timeframe);
    let reports = orchestrator.report_many(&symbols, as_of).await;

    for report in &reports {
        log_summary(report);
    }

    let output = if summary_only {
        serde_json::to_string_pretty(&reports.iter().map(summary_json).collect::<Vec<_>>())
    } else {
        serde_json::to_string_pretty(&reports)
    }
    .context("serializing reports")?;
    println!("{output}");

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ticker_report=info,analysis_orchestrator=info".into());

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // stdout carries the report, so logs go to stderr
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn log_summary(report: &TickerReport) {
    match report.price_change.value() {
        Some(change) => tracing::info!(
            "{}: {} ({})",
            report.symbol,
            format_currency(change.current),
            format_signed_pct(change.delta_pct)
        ),
        None => tracing::warn!("{}: no price history", report.symbol),
    }

    if let Some(dcf) = report.dcf.value() {
        for scenario in dcf.scenarios.iter().filter_map(|s| s.valuation()) {
            tracing::info!(
                "  DCF {:<12} {:>10} {}",
                scenario.label,
                format_currency(scenario.intrinsic_value),
                scenario.upside_pct.map(format_signed_pct).unwrap_or_default()
            );
        }
    }

    for error in &report.source_errors {
        tracing::warn!("  {}: {}", report.symbol, error);
    }
}

/// Report without the per-bar series.
fn summary_json(report: &TickerReport) -> serde_json::Value {
    serde_json::json!({
        "symbol": report.symbol,
        "as_of": report.as_of,
        "last_session": report.last_session,
        "price_change": report.price_change,
        "bullish_markers": report.bullish_markers.len(),
        "bearish_markers": report.bearish_markers.len(),
        "eps": report.eps,
        "ratios": report.ratios,
        "dcf": report.dcf,
        "insider": report.insider,
        "source_errors": report.source_errors,
    })
}
