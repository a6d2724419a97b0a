use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{AnalysisError, SessionDate};

/// OHLCV bar data. The timestamp keeps the offset it was reported with so
/// the session date is the exchange's calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Trading session this bar belongs to
    pub fn session(&self) -> NaiveDate {
        self.timestamp.session_date()
    }
}

/// One financial statement: line item -> (period end -> value).
///
/// Periods are kept in ascending order. A value that the provider did not
/// report for a given item/period is simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementTable {
    rows: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl StatementTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value. Non-finite values are treated as "not reported".
    pub fn insert(&mut self, item: &str, period: NaiveDate, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.rows
            .entry(item.to_string())
            .or_default()
            .insert(period, value);
    }

    pub fn with(mut self, item: &str, period: NaiveDate, value: f64) -> Self {
        self.insert(item, period, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.values().all(|r| r.is_empty())
    }

    /// A line item's reported values, or `None` when the item has none.
    pub fn row(&self, item: &str) -> Option<&BTreeMap<NaiveDate, f64>> {
        self.rows.get(item).filter(|r| !r.is_empty())
    }

    /// All reporting periods across every line item, ascending.
    pub fn periods(&self) -> Vec<NaiveDate> {
        let mut periods: Vec<NaiveDate> = self.rows.values().flat_map(|r| r.keys().copied()).collect();
        periods.sort_unstable();
        periods.dedup();
        periods
    }

    pub fn latest_period(&self) -> Option<NaiveDate> {
        self.rows.values().filter_map(|r| r.keys().next_back().copied()).max()
    }

    /// Value of `item` at the table's most recent period.
    pub fn latest(&self, item: &str) -> Option<f64> {
        let period = self.latest_period()?;
        self.rows.get(item)?.get(&period).copied()
    }

    /// First item in `candidates` that has any reported value, with its name.
    pub fn first_available<'a>(
        &self,
        candidates: &[&'a str],
    ) -> Option<(&'a str, &BTreeMap<NaiveDate, f64>)> {
        candidates
            .iter()
            .find_map(|&name| self.row(name).map(|row| (name, row)))
    }

    /// Latest-period value of the first candidate reported at that period.
    pub fn latest_of<'a>(&self, candidates: &[&'a str]) -> Option<(&'a str, f64)> {
        candidates
            .iter()
            .find_map(|&name| self.latest(name).map(|v| (name, v)))
    }
}

/// Income statement, balance sheet and cash-flow statement at one cadence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatements {
    #[serde(default)]
    pub income: StatementTable,
    #[serde(default)]
    pub balance_sheet: StatementTable,
    #[serde(default)]
    pub cash_flow: StatementTable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementSet {
    #[serde(default)]
    pub annual: FinancialStatements,
    #[serde(default)]
    pub quarterly: FinancialStatements,
}

/// Stock split. `ratio` is new shares per old share (4.0 for a 4:1 split).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub effective: DateTime<FixedOffset>,
    pub ratio: f64,
}

impl Split {
    pub fn new(effective: DateTime<FixedOffset>, ratio: f64) -> Result<Self, AnalysisError> {
        let split = Self { effective, ratio };
        split.validate()?;
        Ok(split)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.ratio.is_finite() || self.ratio <= 0.0 {
            return Err(AnalysisError::InvalidData(format!(
                "split ratio must be positive, got {} on {}",
                self.ratio, self.effective
            )));
        }
        Ok(())
    }
}

/// Point-in-time fundamentals from the market-data provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FundamentalsSnapshot {
    pub market_cap: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub total_cash: Option<f64>,
    #[serde(rename = "freeCashflow")]
    pub free_cash_flow: Option<f64>,
    pub total_revenue: Option<f64>,
    pub net_income_to_common: Option<f64>,
    pub book_value: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub recommendation_mean: Option<f64>,
    #[serde(rename = "trailingPE")]
    pub trailing_pe: Option<f64>,
    #[serde(rename = "forwardPE")]
    pub forward_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub trailing_peg_ratio: Option<f64>,
    #[serde(rename = "priceToSalesTrailing12Months")]
    pub price_to_sales: Option<f64>,
    pub price_to_book: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub current_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub gross_margins: Option<f64>,
    pub operating_margins: Option<f64>,
    pub profit_margins: Option<f64>,
    pub payout_ratio: Option<f64>,
    pub held_percent_insiders: Option<f64>,
    pub held_percent_institutions: Option<f64>,
    pub beta: Option<f64>,
    pub previous_close: Option<f64>,
}

/// A named DCF assumption set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub label: String,
    pub wacc: f64,
    pub growth: f64,
    pub terminal_growth: f64,
    pub color: String,
}

impl ScenarioParams {
    pub fn new(label: &str, wacc: f64, growth: f64, terminal_growth: f64, color: &str) -> Self {
        Self {
            label: label.to_string(),
            wacc,
            growth,
            terminal_growth,
            color: color.to_string(),
        }
    }
}

/// Insider transaction as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderTransaction {
    pub start_date: NaiveDate,
    #[serde(default)]
    pub insider: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub shares: Option<f64>,
    #[serde(default)]
    pub value: Option<f64>,
}

/// Bar granularity requested from the data-access layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    Day1,
    Week1,
    Month1,
}

impl Timeframe {
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Day1 => "1d",
            Timeframe::Week1 => "1wk",
            Timeframe::Month1 => "1mo",
        }
    }
}

/// A derived value handed to the presentation layer, or the reason it is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Derived<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Derived<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Derived::Unavailable { reason: reason.into() }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Derived::Available(v) => Some(v),
            Derived::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Derived::Available(_))
    }
}

impl<T> From<Result<T, AnalysisError>> for Derived<T> {
    fn from(result: Result<T, AnalysisError>) -> Self {
        match result {
            Ok(v) => Derived::Available(v),
            Err(e) => Derived::Unavailable { reason: e.to_string() },
        }
    }
}
