use std::sync::Arc;

use analysis_core::{AnalysisConfig, AnalysisError, MarketDataSource, Timeframe};
use chrono::NaiveDate;
use tokio::task::JoinSet;

pub mod report;
pub use report::{analyze, analyze_batch, TickerInputs, TickerReport};

/// Pulls inputs through the injected data source and runs the analysis
/// crates over them. Holds no cache; the source owns fetch policy.
pub struct AnalysisOrchestrator<S> {
    source: Arc<S>,
    config: AnalysisConfig,
    timeframe: Timeframe,
}

impl<S: MarketDataSource + 'static> AnalysisOrchestrator<S> {
    pub fn new(source: S, config: AnalysisConfig) -> Self {
        Self {
            source: Arc::new(source),
            config,
            timeframe: Timeframe::Day1,
        }
    }

    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = timeframe;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub async fn fetch_inputs(&self, symbol: &str) -> TickerInputs {
        fetch_inputs(self.source.as_ref(), symbol, self.timeframe).await
    }

    pub async fn report(&self, symbol: &str, as_of: NaiveDate) -> TickerReport {
        tracing::info!("Building report for {} ({})", symbol, self.timeframe.label());
        let inputs = self.fetch_inputs(symbol).await;
        analyze(&inputs, &self.config, as_of)
    }

    /// Fetch all symbols concurrently, then analyze them in parallel.
    /// Reports come back in the order of `symbols`.
    pub async fn report_many(&self, symbols: &[String], as_of: NaiveDate) -> Vec<TickerReport> {
        tracing::info!("Building reports for {} symbols", symbols.len());

        let mut tasks = JoinSet::new();
        for (idx, symbol) in symbols.iter().cloned().enumerate() {
            let source = Arc::clone(&self.source);
            let timeframe = self.timeframe;
            tasks.spawn(async move {
                let inputs = fetch_inputs(source.as_ref(), &symbol, timeframe).await;
                (idx, inputs)
            });
        }

        let mut slots: Vec<Option<TickerInputs>> = vec![None; symbols.len()];
        let mut join_errors = Vec::new();
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok((idx, inputs)) => slots[idx] = Some(inputs),
                Err(e) => {
                    tracing::error!("Fetch task error: {}", e);
                    join_errors.push(e.to_string());
                }
            }
        }

        // A task that died takes its index with it, so every unfilled slot
        // gets an empty input set carrying the join errors.
        let inputs: Vec<TickerInputs> = slots
            .into_iter()
            .zip(symbols)
            .map(|(slot, symbol)| {
                slot.unwrap_or_else(|| TickerInputs {
                    symbol: symbol.clone(),
                    source_errors: vec![format!("fetch task: {}", join_errors.join("; "))],
                    ..Default::default()
                })
            })
            .collect();
        let reports = analyze_batch(&inputs, &self.config, as_of);

        tracing::info!("Built {}/{} reports", reports.len(), symbols.len());
        reports
    }
}

/// Fetch every input concurrently. A failed fetch leaves that input empty
/// and is recorded on the result rather than aborting the ticker.
pub async fn fetch_inputs<S>(source: &S, symbol: &str, timeframe: Timeframe) -> TickerInputs
where
    S: MarketDataSource + ?Sized,
{
    let (bars, statements, splits, fundamentals, insiders) = tokio::join!(
        source.price_history(symbol, timeframe),
        source.statements(symbol),
        source.splits(symbol),
        source.fundamentals(symbol),
        source.insider_transactions(symbol),
    );

    let mut source_errors = Vec::new();
    let mut bars = or_empty(symbol, "price history", bars, &mut source_errors);
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);

    TickerInputs {
        symbol: symbol.to_string(),
        bars,
        statements: or_empty(symbol, "statements", statements, &mut source_errors),
        splits: or_empty(symbol, "splits", splits, &mut source_errors),
        fundamentals: or_empty(symbol, "fundamentals", fundamentals, &mut source_errors),
        insider_transactions: or_empty(symbol, "insider transactions", insiders, &mut source_errors),
        source_errors,
    }
}

fn or_empty<T: Default>(
    symbol: &str,
    what: &str,
    result: Result<T, AnalysisError>,
    errors: &mut Vec<String>,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to fetch {} for {}: {}", what, symbol, e);
            errors.push(format!("{}: {}", what, e));
            T::default()
        }
    }
}
