use analysis_core::{AnalysisError, InsiderTransaction};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Buy if the description mentions a purchase, otherwise sell if it mentions
/// a sale. Anything else (grants, option exercises, gifts) is not counted.
pub fn classify(tx: &InsiderTransaction) -> Option<TradeSide> {
    let description = format!(
        "{}{}",
        tx.text.as_deref().unwrap_or_default(),
        tx.transaction.as_deref().unwrap_or_default()
    )
    .to_lowercase();

    if description.contains("purchase") || description.contains("buy") {
        Some(TradeSide::Buy)
    } else if description.contains("sale") || description.contains("sell") {
        Some(TradeSide::Sell)
    } else {
        None
    }
}

pub fn implied_price(tx: &InsiderTransaction) -> Option<f64> {
    match (tx.value, tx.shares) {
        (Some(value), Some(shares)) if shares != 0.0 => Some(value / shares),
        _ => None,
    }
}

/// One transaction row as shown in the ownership view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderActivity {
    pub start_date: NaiveDate,
    pub insider: Option<String>,
    pub side: Option<TradeSide>,
    pub shares: Option<f64>,
    pub value: Option<f64>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderSummary {
    pub window_start: NaiveDate,
    pub as_of: NaiveDate,
    pub buy_count: usize,
    pub sell_count: usize,
    pub buy_value: f64,
    pub sell_value: f64,
    pub buy_count_ratio: f64,
    pub sell_count_ratio: f64,
    /// `None` when neither side reported a value
    pub buy_value_ratio: Option<f64>,
    pub sell_value_ratio: Option<f64>,
    /// Transactions in the window, newest first
    pub recent: Vec<InsiderActivity>,
}

/// Buy/sell balance over the year ending at `as_of`, both ends inclusive.
pub fn summarize_insider_activity(
    transactions: &[InsiderTransaction],
    as_of: NaiveDate,
) -> Result<InsiderSummary, AnalysisError> {
    let window_start = as_of.checked_sub_months(Months::new(12)).unwrap_or(NaiveDate::MIN);

    let mut in_window: Vec<&InsiderTransaction> = transactions
        .iter()
        .filter(|tx| tx.start_date >= window_start && tx.start_date <= as_of)
        .collect();
    in_window.sort_by(|a, b| b.start_date.cmp(&a.start_date));

    let (mut buy_count, mut sell_count) = (0usize, 0usize);
    let (mut buy_value, mut sell_value) = (0.0, 0.0);
    let mut recent = Vec::with_capacity(in_window.len());

    for tx in in_window {
        let side = classify(tx);
        let value = tx.value.filter(|v| v.is_finite()).unwrap_or(0.0);
        match side {
            Some(TradeSide::Buy) => {
                buy_count += 1;
                buy_value += value;
            }
            Some(TradeSide::Sell) => {
                sell_count += 1;
                sell_value += value;
            }
            None => {}
        }
        recent.push(InsiderActivity {
            start_date: tx.start_date,
            insider: tx.insider.clone(),
            side,
            shares: tx.shares,
            value: tx.value,
            price: implied_price(tx),
        });
    }

    let total_count = buy_count + sell_count;
    if total_count == 0 {
        return Err(AnalysisError::MissingData(format!(
            "no insider buys or sells between {} and {}",
            window_start, as_of
        )));
    }

    let total_value = buy_value + sell_value;
    let (buy_value_ratio, sell_value_ratio) = if total_value > 0.0 {
        (Some(buy_value / total_value), Some(sell_value / total_value))
    } else {
        (None, None)
    };

    Ok(InsiderSummary {
        window_start,
        as_of,
        buy_count,
        sell_count,
        buy_value,
        sell_value,
        buy_count_ratio: buy_count as f64 / total_count as f64,
        sell_count_ratio: sell_count as f64 / total_count as f64,
        buy_value_ratio,
        sell_value_ratio,
        recent,
    })
}
