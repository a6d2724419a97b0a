use analysis_core::{
    AnalysisConfig, Bar, Derived, FundamentalsSnapshot, InsiderTransaction, Split, StatementSet,
};
use chrono::NaiveDate;
use fundamental_analysis::{DcfValuation, EpsSeries, FundamentalAnalysisEngine, InsiderSummary, PeBands, RatioSheet};
use rayon::prelude::*;
use serde::Serialize;
use technical_analysis::{pattern_markers, AnnotatedBar, PatternMarker, PriceChange, TechnicalAnalysisEngine};

/// Everything fetched for one ticker, already in memory. Inputs the data
/// source could not provide are left empty and noted in `source_errors`.
#[derive(Debug, Clone, Default)]
pub struct TickerInputs {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub statements: StatementSet,
    pub splits: Vec<Split>,
    pub fundamentals: FundamentalsSnapshot,
    pub insider_transactions: Vec<InsiderTransaction>,
    pub source_errors: Vec<String>,
}

/// Derived views for one ticker.
#[derive(Debug, Clone, Serialize)]
pub struct TickerReport {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub last_session: Option<NaiveDate>,
    pub price_change: Derived<PriceChange>,
    pub indicators_available: bool,
    pub series: Vec<AnnotatedBar>,
    pub bullish_markers: Vec<PatternMarker>,
    pub bearish_markers: Vec<PatternMarker>,
    pub eps: Derived<EpsSeries>,
    pub pe_bands: Derived<PeBands>,
    pub ratios: RatioSheet,
    pub dcf: Derived<DcfValuation>,
    pub insider: Derived<InsiderSummary>,
    pub source_errors: Vec<String>,
}

/// Run every component over one ticker's inputs. Each derived value fails on
/// its own; the report is always produced.
pub fn analyze(inputs: &TickerInputs, config: &AnalysisConfig, as_of: NaiveDate) -> TickerReport {
    let technical = TechnicalAnalysisEngine::new(config.indicators.clone());
    let fundamental = FundamentalAnalysisEngine::new(config.clone());
    let bars = &inputs.bars;

    let series = technical.annotate(bars);
    let indicators_available = series.first().is_some_and(|row| row.rsi.is_some());
    let (bullish_markers, bearish_markers) = pattern_markers(&series);

    let eps = fundamental.eps_series(&inputs.statements, &inputs.splits);
    let pe_bands = match &eps {
        Ok(eps) => Derived::Available(fundamental.pe_bands(eps, bars)),
        Err(e) => Derived::unavailable(format!("no EPS series: {}", e)),
    };

    let report = TickerReport {
        symbol: inputs.symbol.clone(),
        as_of,
        last_session: bars.last().map(Bar::session),
        price_change: technical.price_change(bars).into(),
        indicators_available,
        series,
        bullish_markers,
        bearish_markers,
        eps: eps.into(),
        pe_bands,
        ratios: fundamental.ratios(&inputs.fundamentals, &inputs.statements, bars),
        dcf: fundamental.dcf(&inputs.statements, &inputs.fundamentals, bars).into(),
        insider: fundamental.insider_summary(&inputs.insider_transactions, as_of).into(),
        source_errors: inputs.source_errors.clone(),
    };

    tracing::debug!(
        "Analyzed {}: {} bars, eps={}, dcf={}, insider={}",
        report.symbol,
        report.series.len(),
        report.eps.is_available(),
        report.dcf.is_available(),
        report.insider.is_available()
    );

    report
}

/// Analyze many tickers in parallel. Output order matches `inputs`.
pub fn analyze_batch(inputs: &[TickerInputs], config: &AnalysisConfig, as_of: NaiveDate) -> Vec<TickerReport> {
    inputs
        .par_iter()
        .map(|ticker| analyze(ticker, config, as_of))
        .collect()
}
