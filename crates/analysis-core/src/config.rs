use serde::{Deserialize, Serialize};

use crate::{AnalysisError, ScenarioParams};

/// Indicator periods (RSI(14), MACD(12, 26, 9) by default)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

/// Configuration for the derivation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub indicators: IndicatorParams,
    pub pe_band_multiples: Vec<f64>,   // 10x .. 30x
    pub fallback_tax_rate: f64,        // 0.21 when pretax income is unusable
    pub scenarios: Vec<ScenarioParams>, // severity-ranked, most bearish first
}

/// Built-in DCF catalog, most bearish first.
pub fn default_scenarios() -> Vec<ScenarioParams> {
    vec![
        ScenarioParams::new("Deep Bear", 0.12, 0.05, 0.015, "#b71c1c"),
        ScenarioParams::new("Bear", 0.11, 0.10, 0.02, "#ff4b4b"),
        ScenarioParams::new("Base", 0.09, 0.15, 0.025, "#f0f2f6"),
        ScenarioParams::new("Bull", 0.07, 0.20, 0.03, "#39e75f"),
        ScenarioParams::new("Strong Bull", 0.065, 0.25, 0.035, "#2e7d32"),
    ]
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorParams::default(),
            pe_band_multiples: vec![10.0, 15.0, 20.0, 25.0, 30.0],
            fallback_tax_rate: 0.21,
            scenarios: default_scenarios(),
        }
    }
}

impl AnalysisConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, AnalysisError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_vars<F>(get: F) -> Result<Self, AnalysisError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let indicators = IndicatorParams {
            rsi_period: parse_or(&get, "RSI_PERIOD", defaults.indicators.rsi_period)?,
            macd_fast: parse_or(&get, "MACD_FAST", defaults.indicators.macd_fast)?,
            macd_slow: parse_or(&get, "MACD_SLOW", defaults.indicators.macd_slow)?,
            macd_signal: parse_or(&get, "MACD_SIGNAL", defaults.indicators.macd_signal)?,
        };

        let pe_band_multiples = match get("PE_BAND_MULTIPLES") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<f64>().map_err(|e| {
                        AnalysisError::InvalidConfig(format!("PE_BAND_MULTIPLES entry {s:?}: {e}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => defaults.pe_band_multiples,
        };

        let scenarios = match get("DCF_SCENARIOS_FILE") {
            Some(path) => load_scenarios(&path)?,
            None => defaults.scenarios,
        };

        let config = Self {
            indicators,
            pe_band_multiples,
            fallback_tax_rate: parse_or(&get, "FALLBACK_TAX_RATE", defaults.fallback_tax_rate)?,
            scenarios,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        let p = &self.indicators;
        if p.rsi_period == 0 || p.macd_fast == 0 || p.macd_slow == 0 || p.macd_signal == 0 {
            return Err(AnalysisError::InvalidConfig("indicator periods must be positive".into()));
        }
        if p.macd_fast >= p.macd_slow {
            return Err(AnalysisError::InvalidConfig(format!(
                "MACD fast period ({}) must be shorter than slow period ({})",
                p.macd_fast, p.macd_slow
            )));
        }
        if self.pe_band_multiples.iter().any(|m| !m.is_finite() || *m <= 0.0) {
            return Err(AnalysisError::InvalidConfig("P/E band multiples must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.fallback_tax_rate) {
            return Err(AnalysisError::InvalidConfig(format!(
                "fallback tax rate {} outside [0, 1)",
                self.fallback_tax_rate
            )));
        }
        if self.scenarios.is_empty() {
            return Err(AnalysisError::InvalidConfig("DCF scenario catalog is empty".into()));
        }
        Ok(())
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> Result<T, AnalysisError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AnalysisError::InvalidConfig(format!("{key}={raw:?}: {e}"))),
        None => Ok(default),
    }
}

/// Read a JSON array of scenarios.
pub fn load_scenarios(path: &str) -> Result<Vec<ScenarioParams>, AnalysisError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AnalysisError::InvalidConfig(format!("reading {path}: {e}")))?;
    serde_json::from_str(&raw)
        .map_err(|e| AnalysisError::InvalidConfig(format!("parsing {path}: {e}")))
}
