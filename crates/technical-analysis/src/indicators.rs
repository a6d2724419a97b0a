use analysis_core::{Bar, IndicatorParams};
use serde::{Deserialize, Serialize};

/// Exponentially weighted mean with smoothing factor `alpha`.
///
/// Recursive form seeded at the first observation:
/// `y[0] = x[0]`, `y[t] = alpha * x[t] + (1 - alpha) * y[t-1]`.
pub fn ewm(data: &[f64], alpha: f64) -> Vec<f64> {
    let mut result = Vec::with_capacity(data.len());
    let mut prev: Option<f64> = None;

    for &x in data {
        let value = match prev {
            None => x,
            Some(p) => alpha * x + (1.0 - alpha) * p,
        };
        result.push(value);
        prev = Some(value);
    }

    result
}

/// Exponential Moving Average by span (`alpha = 2 / (period + 1)`), seeded at
/// the first value with no SMA warm-up. One output per input.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![];
    }
    ewm(data, 2.0 / (period as f64 + 1.0))
}

/// RSI from smoothed average gain and loss.
///
/// Tie-breaks when the average loss is exactly zero: 100 if there was any
/// gain, 50 if there was no movement at all.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return if avg_gain > 0.0 { 100.0 } else { 50.0 };
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Relative Strength Index with Wilder smoothing (`alpha = 1 / period`).
///
/// One value per input. The change at t = 0 is taken as zero, and both
/// averages are plain recursive EMAs seeded at the first observation.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.is_empty() {
        return vec![];
    }

    let mut gains = Vec::with_capacity(data.len());
    let mut losses = Vec::with_capacity(data.len());
    gains.push(0.0);
    losses.push(0.0);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let alpha = 1.0 / period as f64;
    let avg_gain = ewm(&gains, alpha);
    let avg_loss = ewm(&losses, alpha);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(&g, &l)| rsi_from_averages(g, l))
        .collect()
}

/// MACD (Moving Average Convergence Divergence)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// All three series have one entry per input value.
pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdResult {
    if fast_period == 0 || slow_period == 0 || signal_period == 0 || slow_period < fast_period {
        return MacdResult { macd_line: vec![], signal_line: vec![], histogram: vec![] };
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();

    let signal_line = ema(&macd_line, signal_period);

    let histogram = macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| m - s)
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Indicator columns aligned one-to-one with the input bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    pub rsi: Vec<f64>,
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// RSI and MACD columns for `bars`.
///
/// Returns `None` when there is nothing to compute from: no bars, or a close
/// column containing non-finite values. Callers treat that as "no indicators
/// available" and keep the bars as they are.
pub fn compute_indicators(bars: &[Bar], params: &IndicatorParams) -> Option<IndicatorFrame> {
    if bars.is_empty() {
        return None;
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    if closes.iter().any(|c| !c.is_finite()) {
        return None;
    }

    let rsi_values = rsi(&closes, params.rsi_period);
    let macd_result = macd(&closes, params.macd_fast, params.macd_slow, params.macd_signal);
    if rsi_values.len() != closes.len() || macd_result.macd_line.len() != closes.len() {
        return None;
    }

    Some(IndicatorFrame {
        rsi: rsi_values,
        macd: macd_result.macd_line,
        signal: macd_result.signal_line,
        histogram: macd_result.histogram,
    })
}
