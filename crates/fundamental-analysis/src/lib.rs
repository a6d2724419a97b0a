pub mod dcf;
pub mod eps;
pub mod insider;
pub mod ratios;

pub use dcf::*;
pub use eps::*;
pub use insider::*;
pub use ratios::*;

use analysis_core::{
    AnalysisConfig, AnalysisError, Bar, FundamentalsSnapshot, InsiderTransaction, Split, StatementSet,
};
use chrono::NaiveDate;

/// Statement-driven derivations for one ticker: EPS and P/E bands, ratios,
/// DCF scenarios and insider activity.
pub struct FundamentalAnalysisEngine {
    config: AnalysisConfig,
}

impl FundamentalAnalysisEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn eps_series(&self, statements: &StatementSet, splits: &[Split]) -> Result<EpsSeries, AnalysisError> {
        normalize_eps(&statements.quarterly.income, &statements.annual.income, splits)
    }

    /// P/E bands at the configured multiples over `bars`.
    pub fn pe_bands(&self, series: &EpsSeries, bars: &[Bar]) -> PeBands {
        let aligned = align_to_bars(series, bars);
        PeBands {
            provenance: series.provenance,
            multiples: self.config.pe_band_multiples.clone(),
            points: pe_bands(bars, &aligned, &self.config.pe_band_multiples),
        }
    }

    pub fn ratios(&self, snapshot: &FundamentalsSnapshot, statements: &StatementSet, bars: &[Bar]) -> RatioSheet {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        compute_ratios(snapshot, &statements.annual, &closes, self.config.fallback_tax_rate)
    }

    /// DCF over the configured scenario catalog. The current price is the
    /// latest close.
    pub fn dcf(
        &self,
        statements: &StatementSet,
        snapshot: &FundamentalsSnapshot,
        bars: &[Bar],
    ) -> Result<DcfValuation, AnalysisError> {
        let current_price = bars.last().map(|b| b.close);
        let inputs = DcfInputs::from_statements(&statements.annual, snapshot.shares_outstanding, current_price)?;
        Ok(run_dcf(&inputs, &self.config.scenarios))
    }

    pub fn insider_summary(
        &self,
        transactions: &[InsiderTransaction],
        as_of: NaiveDate,
    ) -> Result<InsiderSummary, AnalysisError> {
        summarize_insider_activity(transactions, as_of)
    }
}

impl Default for FundamentalAnalysisEngine {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::line_items::{CASH_AND_EQUIVALENTS, DILUTED_EPS, OPERATING_CASH_FLOW};
    use analysis_core::{utc_midnight, StatementTable};
    use chrono::Duration;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bars(start: NaiveDate, closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: utc_midnight(start + Duration::days(i as i64)),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 10.0,
            })
            .collect()
    }

    #[test]
    fn test_pe_bands_use_configured_multiples() {
        let mut statements = StatementSet::default();
        statements.annual.income = StatementTable::new().with(DILUTED_EPS, d(2024, 1, 2), 2.0);

        let engine = FundamentalAnalysisEngine::default();
        let series = engine.eps_series(&statements, &[]).unwrap();
        let bands = engine.pe_bands(&series, &bars(d(2024, 1, 1), &[30.0, 40.0, 50.0]));

        assert_eq!(bands.provenance, EpsProvenance::Annual);
        assert_eq!(bands.multiples.len(), 5);
        assert_eq!(bands.points.len(), 2);
        assert_eq!(bands.points[0].pe, 20.0);
        assert_eq!(bands.points[0].bands, vec![20.0, 30.0, 40.0, 50.0, 60.0]);
    }

    #[test]
    fn test_dcf_uses_latest_close() {
        let mut statements = StatementSet::default();
        statements.annual.cash_flow = StatementTable::new().with(OPERATING_CASH_FLOW, d(2023, 12, 31), 100.0);
        statements.annual.balance_sheet = StatementTable::new().with(CASH_AND_EQUIVALENTS, d(2023, 12, 31), 50.0);
        let snapshot = FundamentalsSnapshot {
            shares_outstanding: Some(100.0),
            ..Default::default()
        };

        let engine = FundamentalAnalysisEngine::default();
        let dcf = engine.dcf(&statements, &snapshot, &bars(d(2024, 1, 1), &[10.0, 12.5])).unwrap();

        assert!(dcf.shares_reliable);
        assert_eq!(dcf.scenarios.len(), 5);
        let base = dcf.scenarios[2].valuation().unwrap();
        assert_eq!(base.label, "Base");
        let expected = (base.intrinsic_value - 12.5) / 12.5 * 100.0;
        assert_eq!(base.upside_pct, Some(expected));
    }

    #[test]
    fn test_dcf_unavailable_without_statements() {
        let engine = FundamentalAnalysisEngine::default();
        let result = engine.dcf(&StatementSet::default(), &FundamentalsSnapshot::default(), &[]);
        assert!(matches!(result, Err(AnalysisError::MissingData(_))));
    }

    #[test]
    fn test_scenario_outcomes_serialize_with_status_tag() {
        let catalog = vec![
            analysis_core::ScenarioParams::new("Base", 0.09, 0.15, 0.025, "#f0f2f6"),
            analysis_core::ScenarioParams::new("Flat", 0.02, 0.0, 0.02, "#999999"),
        ];
        let inputs = DcfInputs {
            operating_cash_flow: 100.0,
            capex: 0.0,
            capex_source: None,
            total_debt: 0.0,
            cash_and_equivalents: 0.0,
            shares_outstanding: Some(1.0),
            current_price: None,
        };
        let json = serde_json::to_value(run_dcf(&inputs, &catalog)).unwrap();

        assert_eq!(json["scenarios"][0]["status"], "valued");
        assert_eq!(json["scenarios"][0]["label"], "Base");
        assert_eq!(json["scenarios"][1]["status"], "invalid");
        assert_eq!(json["scenarios"][1]["label"], "Flat");
    }
}
