use async_trait::async_trait;

use crate::{
    AnalysisError, Bar, FundamentalsSnapshot, InsiderTransaction, Split, StatementSet, Timeframe,
};

/// Data-access collaborator that hands already-fetched tables to the analysis
/// crates. Fetching, caching and retry policy live behind this trait; the
/// analysis code never holds any state of its own.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn price_history(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Bar>, AnalysisError>;

    async fn statements(&self, symbol: &str) -> Result<StatementSet, AnalysisError>;

    async fn splits(&self, symbol: &str) -> Result<Vec<Split>, AnalysisError>;

    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot, AnalysisError>;

    /// Providers without insider data can rely on the empty default.
    async fn insider_transactions(&self, _symbol: &str) -> Result<Vec<InsiderTransaction>, AnalysisError> {
        Ok(Vec::new())
    }
}
