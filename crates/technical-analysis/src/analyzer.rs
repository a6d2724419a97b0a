use analysis_core::{AnalysisError, Bar, IndicatorParams};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::indicators::*;
use crate::patterns::*;

/// A bar with its derived columns attached. Indicator fields are `None` when
/// indicators could not be computed for the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedBar {
    #[serde(flatten)]
    pub bar: Bar,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal_line: Option<f64>,
    pub macd_hist: Option<f64>,
    pub pattern: CandlestickPattern,
    pub pattern_marker: Option<f64>,
}

/// Chart overlay point for a detected pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMarker {
    pub timestamp: DateTime<FixedOffset>,
    pub price: f64,
    pub pattern: CandlestickPattern,
}

/// Day-over-day move of the latest close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub current: f64,
    pub previous: f64,
    pub delta: f64,
    pub delta_pct: f64,
}

pub struct TechnicalAnalysisEngine {
    params: IndicatorParams,
}

impl TechnicalAnalysisEngine {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }

    /// Attach RSI, MACD and pattern columns to `bars`, one row per bar.
    pub fn annotate(&self, bars: &[Bar]) -> Vec<AnnotatedBar> {
        let frame = compute_indicators(bars, &self.params);
        let patterns = detect_patterns(bars);

        bars.iter()
            .zip(patterns)
            .enumerate()
            .map(|(i, (bar, found))| {
                let (rsi, macd, signal_line, macd_hist) = match &frame {
                    Some(f) => (Some(f.rsi[i]), Some(f.macd[i]), Some(f.signal[i]), Some(f.histogram[i])),
                    None => (None, None, None, None),
                };
                AnnotatedBar {
                    bar: bar.clone(),
                    rsi,
                    macd,
                    signal_line,
                    macd_hist,
                    pattern: found.pattern,
                    pattern_marker: found.marker,
                }
            })
            .collect()
    }

    /// Latest close against the one before it.
    pub fn price_change(&self, bars: &[Bar]) -> Result<PriceChange, AnalysisError> {
        let current = bars
            .last()
            .map(|b| b.close)
            .ok_or_else(|| AnalysisError::MissingData("no price history".to_string()))?;
        let previous = if bars.len() > 1 { bars[bars.len() - 2].close } else { current };

        let delta = current - previous;
        let delta_pct = if previous != 0.0 { (delta / previous) * 100.0 } else { 0.0 };

        Ok(PriceChange { current, previous, delta, delta_pct })
    }
}

impl Default for TechnicalAnalysisEngine {
    fn default() -> Self {
        Self::new(IndicatorParams::default())
    }
}

/// Split detected patterns into bullish and bearish overlay series.
pub fn pattern_markers(series: &[AnnotatedBar]) -> (Vec<PatternMarker>, Vec<PatternMarker>) {
    series
        .iter()
        .filter_map(|row| {
            row.pattern_marker.map(|price| PatternMarker {
                timestamp: row.bar.timestamp,
                price,
                pattern: row.pattern,
            })
        })
        .partition(|m| m.pattern.is_bullish())
}
