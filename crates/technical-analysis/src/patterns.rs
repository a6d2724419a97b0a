use analysis_core::Bar;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandlestickPattern {
    None,
    Hammer,
    BullishEngulfing,
    BearishEngulfing,
}

impl CandlestickPattern {
    pub fn label(&self) -> &'static str {
        match self {
            CandlestickPattern::None => "none",
            CandlestickPattern::Hammer => "Hammer",
            CandlestickPattern::BullishEngulfing => "Bullish Engulfing",
            CandlestickPattern::BearishEngulfing => "Bearish Engulfing",
        }
    }

    /// Bullish markers plot below the bar, bearish ones above it.
    pub fn is_bullish(&self) -> bool {
        matches!(self, CandlestickPattern::Hammer | CandlestickPattern::BullishEngulfing)
    }
}

/// Classification of one bar, with the price at which to draw its marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern: CandlestickPattern,
    pub marker: Option<f64>,
}

impl PatternMatch {
    pub const NONE: PatternMatch = PatternMatch { pattern: CandlestickPattern::None, marker: None };

    fn at(pattern: CandlestickPattern, marker: f64) -> Self {
        Self { pattern, marker: Some(marker) }
    }
}

/// Hammer: long lower shadow (>= 2x body), short upper shadow (<= 0.5x body).
fn is_hammer(bar: &Bar) -> bool {
    let body = (bar.close - bar.open).abs();
    let lower_shadow = bar.open.min(bar.close) - bar.low;
    let upper_shadow = bar.high - bar.open.max(bar.close);

    body > 0.0 && lower_shadow >= 2.0 * body && upper_shadow <= body * 0.5
}

/// Bearish bar followed by a bullish bar whose body covers it.
fn is_bullish_engulfing(prev: &Bar, curr: &Bar) -> bool {
    let prev_bearish = prev.close < prev.open;
    let curr_bullish = curr.close > curr.open;
    prev_bearish && curr_bullish && curr.open < prev.close && curr.close > prev.open
}

/// Bullish bar followed by a bearish bar whose body covers it.
fn is_bearish_engulfing(prev: &Bar, curr: &Bar) -> bool {
    let prev_bullish = prev.close > prev.open;
    let curr_bearish = curr.close < curr.open;
    prev_bullish && curr_bearish && curr.open > prev.close && curr.close < prev.open
}

/// Classify `curr` against `prev`. First match wins: Hammer, then Bullish
/// Engulfing, then Bearish Engulfing.
pub fn classify_bar(prev: &Bar, curr: &Bar) -> PatternMatch {
    if is_hammer(curr) {
        PatternMatch::at(CandlestickPattern::Hammer, curr.low)
    } else if is_bullish_engulfing(prev, curr) {
        PatternMatch::at(CandlestickPattern::BullishEngulfing, curr.low)
    } else if is_bearish_engulfing(prev, curr) {
        PatternMatch::at(CandlestickPattern::BearishEngulfing, curr.high)
    } else {
        PatternMatch::NONE
    }
}

/// One classification per bar, aligned with the input. The first bar has no
/// predecessor and is always `None`.
pub fn detect_patterns(bars: &[Bar]) -> Vec<PatternMatch> {
    let mut patterns = Vec::with_capacity(bars.len());
    let mut prev: Option<&Bar> = None;

    for bar in bars {
        let found = match prev {
            Some(p) => classify_bar(p, bar),
            None => PatternMatch::NONE,
        };
        patterns.push(found);
        prev = Some(bar);
    }

    patterns
}
