//! `MarketDataSource` over JSON fixtures on disk, one `<SYMBOL>.json` per ticker.

use std::collections::BTreeMap;
use std::path::PathBuf;

use analysis_core::{
    parse_session_date, utc_midnight, AnalysisError, Bar, FinancialStatements, FundamentalsSnapshot,
    InsiderTransaction, MarketDataSource, SessionDate, Split, StatementSet, StatementTable, Timeframe,
};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;

/// Line item -> period string -> value, as exported by the provider. Periods
/// may carry a time part and values may be null.
type RawTable = BTreeMap<String, BTreeMap<String, Option<f64>>>;

#[derive(Debug, Default, Deserialize)]
struct RawStatements {
    #[serde(default)]
    income: RawTable,
    #[serde(default)]
    balance_sheet: RawTable,
    #[serde(default)]
    cash_flow: RawTable,
}

#[derive(Debug, Default, Deserialize)]
struct RawStatementSet {
    #[serde(default)]
    annual: RawStatements,
    #[serde(default)]
    quarterly: RawStatements,
}

#[derive(Debug, Deserialize)]
struct RawSplit {
    date: String,
    ratio: f64,
}

#[derive(Debug, Deserialize)]
struct TickerFixture {
    #[serde(default)]
    bars: Vec<Bar>,
    #[serde(default)]
    weekly_bars: Option<Vec<Bar>>,
    #[serde(default)]
    monthly_bars: Option<Vec<Bar>>,
    #[serde(default)]
    statements: RawStatementSet,
    #[serde(default)]
    splits: Vec<RawSplit>,
    #[serde(default)]
    fundamentals: Option<FundamentalsSnapshot>,
    #[serde(default)]
    insider_transactions: Vec<InsiderTransaction>,
}

pub struct JsonFileSource {
    dir: PathBuf,
}

impl JsonFileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn load(&self, symbol: &str) -> Result<TickerFixture, AnalysisError> {
        let path = self.dir.join(format!("{}.json", symbol.to_uppercase()));
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| AnalysisError::DataSource(format!("reading {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| AnalysisError::DataSource(format!("parsing {}: {}", path.display(), e)))
    }
}

fn to_table(raw: RawTable) -> Result<StatementTable, AnalysisError> {
    let mut table = StatementTable::new();
    for (item, values) in raw {
        for (period, value) in values {
            let period = parse_session_date(&period)?;
            if let Some(v) = value {
                table.insert(&item, period, v);
            }
        }
    }
    Ok(table)
}

fn to_statements(raw: RawStatements) -> Result<FinancialStatements, AnalysisError> {
    Ok(FinancialStatements {
        income: to_table(raw.income)?,
        balance_sheet: to_table(raw.balance_sheet)?,
        cash_flow: to_table(raw.cash_flow)?,
    })
}

/// Splits keep the offset they were reported with. Bare dates are taken as
/// midnight UTC.
fn to_split(raw: RawSplit) -> Result<Split, AnalysisError> {
    let effective = match DateTime::parse_from_rfc3339(raw.date.trim()) {
        Ok(dt) => dt,
        Err(_) => utc_midnight(parse_session_date(&raw.date)?),
    };
    Ok(Split { effective, ratio: raw.ratio })
}

#[async_trait]
impl MarketDataSource for JsonFileSource {
    async fn price_history(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Bar>, AnalysisError> {
        let fixture = self.load(symbol).await?;
        let bars = match timeframe {
            Timeframe::Day1 => Some(fixture.bars),
            Timeframe::Week1 => fixture.weekly_bars,
            Timeframe::Month1 => fixture.monthly_bars,
        };
        bars.ok_or_else(|| AnalysisError::MissingData(format!("no {} bars for {}", timeframe.label(), symbol)))
    }

    async fn statements(&self, symbol: &str) -> Result<StatementSet, AnalysisError> {
        let fixture = self.load(symbol).await?;
        Ok(StatementSet {
            annual: to_statements(fixture.statements.annual)?,
            quarterly: to_statements(fixture.statements.quarterly)?,
        })
    }

    async fn splits(&self, symbol: &str) -> Result<Vec<Split>, AnalysisError> {
        let fixture = self.load(symbol).await?;
        let mut splits = fixture
            .splits
            .into_iter()
            .map(to_split)
            .collect::<Result<Vec<_>, _>>()?;
        splits.sort_by_key(|s| s.effective.session_date());
        Ok(splits)
    }

    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot, AnalysisError> {
        self.load(symbol)
            .await?
            .fundamentals
            .ok_or_else(|| AnalysisError::MissingData(format!("no fundamentals for {}", symbol)))
    }

    async fn insider_transactions(&self, symbol: &str) -> Result<Vec<InsiderTransaction>, AnalysisError> {
        Ok(self.load(symbol).await?.insider_transactions)
    }
}
