use std::collections::BTreeMap;

use analysis_core::line_items::EPS_CANDIDATES;
use analysis_core::{AnalysisError, Bar, SessionDate, Split, StatementTable};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Where the EPS figures came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpsProvenance {
    /// Rolling sum of four quarterly reports
    Ttm,
    /// Annual reports as published
    Annual,
}

impl EpsProvenance {
    pub fn label(&self) -> &'static str {
        match self {
            EpsProvenance::Ttm => "TTM",
            EpsProvenance::Annual => "Annual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpsObservation {
    pub period: NaiveDate,
    pub raw: f64,
    /// Product of all split ratios effective after `period`
    pub split_factor: f64,
    pub adjusted: f64,
}

/// Split-adjusted EPS, ascending by period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpsSeries {
    pub provenance: EpsProvenance,
    /// Statement line item the values were read from
    pub source_row: String,
    pub observations: Vec<EpsObservation>,
}

/// One trading day with EPS > 0 and its valuation multiples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeBandPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub close: f64,
    pub eps: f64,
    pub pe: f64,
    /// `eps * multiple`, in the order of the requested multiples
    pub bands: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeBands {
    pub provenance: EpsProvenance,
    pub multiples: Vec<f64>,
    pub points: Vec<PeBandPoint>,
}

/// Rolling four-period sum over the table's reporting periods. A window is
/// only emitted when all four periods carry a value for `row`.
pub fn trailing_twelve_months(table: &StatementTable, row: &BTreeMap<NaiveDate, f64>) -> Vec<(NaiveDate, f64)> {
    let periods = table.periods();
    if periods.len() < 4 {
        return vec![];
    }

    periods
        .windows(4)
        .filter_map(|window| {
            let values: Option<Vec<f64>> = window.iter().map(|p| row.get(p).copied()).collect();
            values.map(|v| (window[3], v.iter().sum::<f64>()))
        })
        .collect()
}

/// Cumulative adjustment factor for a figure reported on `date`: the product
/// of every split whose effective session is strictly after it.
pub fn split_factor(date: NaiveDate, splits: &[Split]) -> f64 {
    splits
        .iter()
        .filter(|s| s.effective.session_date() > date)
        .map(|s| s.ratio)
        .product()
}

/// Build the split-adjusted EPS series.
///
/// Quarterly diluted EPS (basic as fallback) summed into trailing twelve
/// months is preferred. When fewer than four complete quarters exist the
/// annual row is used unmodified and the provenance says so. Splits with a
/// non-positive ratio are skipped.
pub fn normalize_eps(
    quarterly_income: &StatementTable,
    annual_income: &StatementTable,
    splits: &[Split],
) -> Result<EpsSeries, AnalysisError> {
    let valid_splits: Vec<Split> = splits
        .iter()
        .filter(|s| match s.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Skipping split: {}", e);
                false
            }
        })
        .cloned()
        .collect();

    let ttm = quarterly_income
        .first_available(EPS_CANDIDATES)
        .map(|(name, row)| (name, trailing_twelve_months(quarterly_income, row)))
        .filter(|(_, values)| !values.is_empty());

    let (provenance, source_row, raw) = match ttm {
        Some((name, values)) => (EpsProvenance::Ttm, name, values),
        None => {
            let (name, row) = annual_income.first_available(EPS_CANDIDATES).ok_or_else(|| {
                AnalysisError::MissingData("no EPS row in quarterly or annual income statement".to_string())
            })?;
            tracing::debug!("Not enough quarterly EPS history, using annual {}", name);
            let values: Vec<(NaiveDate, f64)> = row.iter().map(|(&p, &v)| (p, v)).collect();
            (EpsProvenance::Annual, name, values)
        }
    };

    let observations = raw
        .into_iter()
        .map(|(period, value)| {
            let factor = split_factor(period, &valid_splits);
            EpsObservation {
                period,
                raw: value,
                split_factor: factor,
                adjusted: value / factor,
            }
        })
        .collect();

    Ok(EpsSeries {
        provenance,
        source_row: source_row.to_string(),
        observations,
    })
}

/// Backward as-of join of the EPS series onto the bar index: each bar gets
/// the latest observation dated on or before its session, or `None` before
/// the first observation.
pub fn align_to_bars(series: &EpsSeries, bars: &[Bar]) -> Vec<Option<f64>> {
    let obs = &series.observations;
    let mut next = 0;
    let mut current: Option<f64> = None;

    bars.iter()
        .map(|bar| {
            let day = bar.session();
            while next < obs.len() && obs[next].period <= day {
                current = Some(obs[next].adjusted);
                next += 1;
            }
            current
        })
        .collect()
}

/// Per-day P/E and price bands at each multiple. Days without EPS or with
/// EPS <= 0 are left out.
pub fn pe_bands(bars: &[Bar], aligned_eps: &[Option<f64>], multiples: &[f64]) -> Vec<PeBandPoint> {
    bars.iter()
        .zip(aligned_eps)
        .filter_map(|(bar, eps)| {
            let eps = (*eps).filter(|e| *e > 0.0)?;
            Some(PeBandPoint {
                timestamp: bar.timestamp,
                close: bar.close,
                eps,
                pe: bar.close / eps,
                bands: multiples.iter().map(|m| eps * m).collect(),
            })
        })
        .collect()
}
