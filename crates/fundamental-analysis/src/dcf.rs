use analysis_core::line_items::{CAPEX_CANDIDATES, CASH_AND_EQUIVALENTS, OPERATING_CASH_FLOW, TOTAL_DEBT};
use analysis_core::{AnalysisError, FinancialStatements, ScenarioParams};
use serde::{Deserialize, Serialize};

/// Explicit forecast horizon in years
pub const PROJECTION_YEARS: usize = 5;

/// Inputs read from the latest annual statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfInputs {
    pub operating_cash_flow: f64,
    /// Absolute capital expenditure, 0 when no CapEx line was reported
    pub capex: f64,
    pub capex_source: Option<String>,
    pub total_debt: f64,
    pub cash_and_equivalents: f64,
    pub shares_outstanding: Option<f64>,
    pub current_price: Option<f64>,
}

impl DcfInputs {
    /// Operating cash flow is required. CapEx, debt and cash fall back to
    /// zero when the statements do not carry them.
    pub fn from_statements(
        annual: &FinancialStatements,
        shares_outstanding: Option<f64>,
        current_price: Option<f64>,
    ) -> Result<Self, AnalysisError> {
        let cash_flow = &annual.cash_flow;
        let balance = &annual.balance_sheet;

        if cash_flow.is_empty() {
            return Err(AnalysisError::MissingData("annual cash-flow statement".to_string()));
        }
        if balance.is_empty() {
            return Err(AnalysisError::MissingData("annual balance sheet".to_string()));
        }

        let operating_cash_flow = cash_flow.latest(OPERATING_CASH_FLOW).ok_or_else(|| {
            AnalysisError::MissingData(format!("{} for the latest fiscal year", OPERATING_CASH_FLOW))
        })?;

        let (capex, capex_source) = match cash_flow.latest_of(CAPEX_CANDIDATES) {
            Some((name, value)) => {
                tracing::debug!("CapEx taken from {}", name);
                (value.abs(), Some(name.to_string()))
            }
            None => {
                tracing::debug!("No CapEx line reported, assuming 0");
                (0.0, None)
            }
        };

        Ok(Self {
            operating_cash_flow,
            capex,
            capex_source,
            total_debt: balance.latest(TOTAL_DEBT).unwrap_or(0.0),
            cash_and_equivalents: balance.latest(CASH_AND_EQUIVALENTS).unwrap_or(0.0),
            shares_outstanding,
            current_price,
        })
    }

    pub fn base_fcf(&self) -> f64 {
        self.operating_cash_flow - self.capex.abs()
    }

    pub fn net_cash(&self) -> f64 {
        self.cash_and_equivalents - self.total_debt
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioValuation {
    pub label: String,
    pub color: String,
    pub wacc: f64,
    pub growth: f64,
    pub terminal_growth: f64,
    pub projected_fcf: Vec<f64>,
    pub pv_sum: f64,
    pub terminal_value: f64,
    pub pv_terminal: f64,
    pub enterprise_value: f64,
    pub equity_value: f64,
    pub intrinsic_value: f64,
    /// `None` without a positive current price
    pub upside_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Valued(ScenarioValuation),
    Invalid { label: String, reason: String },
}

impl ScenarioOutcome {
    pub fn label(&self) -> &str {
        match self {
            ScenarioOutcome::Valued(v) => &v.label,
            ScenarioOutcome::Invalid { label, .. } => label,
        }
    }

    pub fn valuation(&self) -> Option<&ScenarioValuation> {
        match self {
            ScenarioOutcome::Valued(v) => Some(v),
            ScenarioOutcome::Invalid { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfValuation {
    pub base_fcf: f64,
    pub capex_source: Option<String>,
    pub net_cash: f64,
    /// Share count used for the per-share figures
    pub shares_outstanding: f64,
    /// False when the share count was missing or zero and 1 was used instead
    pub shares_reliable: bool,
    pub scenarios: Vec<ScenarioOutcome>,
}

/// Value one scenario. Rejects parameter sets whose perpetuity diverges
/// (`wacc <= terminal_growth`) or that are not finite.
pub fn value_scenario(
    base_fcf: f64,
    net_cash: f64,
    shares: f64,
    current_price: Option<f64>,
    params: &ScenarioParams,
) -> Result<ScenarioValuation, AnalysisError> {
    let (wacc, growth, terminal) = (params.wacc, params.growth, params.terminal_growth);

    if !(wacc.is_finite() && growth.is_finite() && terminal.is_finite()) {
        return Err(AnalysisError::DegenerateInput(format!(
            "scenario {} has non-finite parameters",
            params.label
        )));
    }
    if wacc <= terminal {
        return Err(AnalysisError::DegenerateInput(format!(
            "scenario {}: wacc {} must exceed terminal growth {}",
            params.label, wacc, terminal
        )));
    }
    if wacc <= -1.0 {
        return Err(AnalysisError::DegenerateInput(format!(
            "scenario {}: wacc {} leaves no discount factor",
            params.label, wacc
        )));
    }

    let mut projected_fcf = Vec::with_capacity(PROJECTION_YEARS);
    let mut fcf = base_fcf;
    for _ in 0..PROJECTION_YEARS {
        fcf *= 1.0 + growth;
        projected_fcf.push(fcf);
    }

    let pv_sum: f64 = projected_fcf
        .iter()
        .enumerate()
        .map(|(i, f)| f / (1.0 + wacc).powi(i as i32 + 1))
        .sum();

    let final_fcf = projected_fcf[PROJECTION_YEARS - 1];
    let terminal_value = final_fcf * (1.0 + terminal) / (wacc - terminal);
    let pv_terminal = terminal_value / (1.0 + wacc).powi(PROJECTION_YEARS as i32);

    let enterprise_value = pv_sum + pv_terminal;
    let equity_value = enterprise_value + net_cash;
    let intrinsic_value = equity_value / shares;
    let upside_pct = current_price
        .filter(|p| *p > 0.0)
        .map(|p| (intrinsic_value - p) / p * 100.0);

    Ok(ScenarioValuation {
        label: params.label.clone(),
        color: params.color.clone(),
        wacc,
        growth,
        terminal_growth: terminal,
        projected_fcf,
        pv_sum,
        terminal_value,
        pv_terminal,
        enterprise_value,
        equity_value,
        intrinsic_value,
        upside_pct,
    })
}

/// Run every scenario in catalog order. An invalid scenario is reported as
/// such and does not affect the others.
pub fn run_dcf(inputs: &DcfInputs, scenarios: &[ScenarioParams]) -> DcfValuation {
    let base_fcf = inputs.base_fcf();
    let net_cash = inputs.net_cash();

    let (shares, shares_reliable) = match inputs.shares_outstanding {
        Some(s) if s > 0.0 && s.is_finite() => (s, true),
        _ => {
            tracing::warn!("Shares outstanding missing or zero, per-share DCF values use 1 share");
            (1.0, false)
        }
    };

    let outcomes = scenarios
        .iter()
        .map(|params| {
            match value_scenario(base_fcf, net_cash, shares, inputs.current_price, params) {
                Ok(v) => ScenarioOutcome::Valued(v),
                Err(e) => {
                    tracing::warn!("DCF scenario {} rejected: {}", params.label, e);
                    ScenarioOutcome::Invalid {
                        label: params.label.clone(),
                        reason: e.to_string(),
                    }
                }
            }
        })
        .collect();

    DcfValuation {
        base_fcf,
        capex_source: inputs.capex_source.clone(),
        net_cash,
        shares_outstanding: shares,
        shares_reliable,
        scenarios: outcomes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::line_items::{CAPITAL_EXPENDITURE, PURCHASE_OF_PPE};
    use analysis_core::{default_scenarios, StatementTable};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn fy(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 9, 30).unwrap()
    }

    fn inputs(base_fcf: f64, net_cash: f64, shares: Option<f64>, price: Option<f64>) -> DcfInputs {
        DcfInputs {
            operating_cash_flow: base_fcf,
            capex: 0.0,
            capex_source: None,
            total_debt: 0.0,
            cash_and_equivalents: net_cash,
            shares_outstanding: shares,
            current_price: price,
        }
    }

    fn scenario(wacc: f64, growth: f64, terminal: f64) -> ScenarioParams {
        ScenarioParams::new("Test", wacc, growth, terminal, "#ffffff")
    }

    /// Direct evaluation of the closed-form formulas.
    fn reference_value(base: f64, wacc: f64, g: f64, t: f64, shares: f64, net_cash: f64) -> f64 {
        let pv: f64 = (1..=5).map(|y| base * (1.0 + g).powi(y) / (1.0 + wacc).powi(y)).sum();
        let fcf5 = base * (1.0 + g).powi(5);
        let tv = fcf5 * (1.0 + t) / (wacc - t);
        (pv + tv / (1.0 + wacc).powi(5) + net_cash) / shares
    }

    #[test]
    fn test_reference_scenario() {
        let v = value_scenario(100.0, 50.0, 100.0, None, &scenario(0.09, 0.15, 0.025)).unwrap();

        let expected_fcf = [115.0, 132.25, 152.0875, 174.900625, 201.13571875];
        for (got, want) in v.projected_fcf.iter().zip(expected_fcf.iter()) {
            assert_relative_eq!(*got, *want, max_relative = 1e-9);
        }
        assert_relative_eq!(
            v.intrinsic_value,
            reference_value(100.0, 0.09, 0.15, 0.025, 100.0, 50.0),
            max_relative = 1e-6
        );
        assert_relative_eq!(v.equity_value, v.enterprise_value + 50.0);
        assert_eq!(v.upside_pct, None);
    }

    #[test]
    fn test_terminal_growth_increases_value() {
        let values: Vec<f64> = [0.0, 0.01, 0.02, 0.03, 0.04, 0.05]
            .iter()
            .map(|&t| {
                value_scenario(100.0, 0.0, 10.0, None, &scenario(0.09, 0.1, t))
                    .unwrap()
                    .intrinsic_value
            })
            .collect();

        for pair in values.windows(2) {
            assert!(pair[1] > pair[0], "{values:?}");
        }
    }

    #[test]
    fn test_wacc_equal_to_terminal_is_invalid() {
        let result = value_scenario(100.0, 0.0, 1.0, None, &scenario(0.03, 0.1, 0.03));
        assert!(matches!(result, Err(AnalysisError::DegenerateInput(_))));

        let below = value_scenario(100.0, 0.0, 1.0, None, &scenario(0.02, 0.1, 0.03));
        assert!(below.is_err());

        let nan = value_scenario(100.0, 0.0, 1.0, None, &scenario(f64::NAN, 0.1, 0.03));
        assert!(nan.is_err());
    }

    #[test]
    fn test_invalid_scenario_does_not_affect_others() {
        let catalog = vec![
            scenario(0.09, 0.15, 0.025),
            ScenarioParams::new("Broken", 0.03, 0.1, 0.03, "#000000"),
            scenario(0.07, 0.2, 0.03),
        ];
        let dcf = run_dcf(&inputs(100.0, 0.0, Some(10.0), Some(50.0)), &catalog);

        assert_eq!(dcf.scenarios.len(), 3);
        assert!(dcf.scenarios[0].valuation().is_some());
        assert!(matches!(&dcf.scenarios[1], ScenarioOutcome::Invalid { label, .. } if label == "Broken"));
        assert!(dcf.scenarios[2].valuation().is_some());
    }

    #[test]
    fn test_upside_against_current_price() {
        let dcf = run_dcf(&inputs(100.0, 50.0, Some(100.0), Some(20.0)), &[scenario(0.09, 0.15, 0.025)]);
        let v = dcf.scenarios[0].valuation().unwrap();
        assert_relative_eq!(v.upside_pct.unwrap(), (v.intrinsic_value - 20.0) / 20.0 * 100.0);
    }

    #[test]
    fn test_missing_shares_flagged_unreliable() {
        let dcf = run_dcf(&inputs(100.0, 0.0, None, None), &default_scenarios());
        assert!(!dcf.shares_reliable);
        assert_eq!(dcf.shares_outstanding, 1.0);

        let zero = run_dcf(&inputs(100.0, 0.0, Some(0.0), None), &default_scenarios());
        assert!(!zero.shares_reliable);

        let ok = run_dcf(&inputs(100.0, 0.0, Some(5.0), None), &default_scenarios());
        assert!(ok.shares_reliable);
        assert_eq!(ok.scenarios.len(), 5);
    }

    #[test]
    fn test_default_catalog_is_severity_ranked() {
        let dcf = run_dcf(&inputs(1_000.0, 0.0, Some(10.0), None), &default_scenarios());
        let values: Vec<f64> = dcf
            .scenarios
            .iter()
            .map(|s| s.valuation().unwrap().intrinsic_value)
            .collect();
        for pair in values.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_inputs_from_statements() {
        let annual = FinancialStatements {
            income: StatementTable::new(),
            balance_sheet: StatementTable::new()
                .with(TOTAL_DEBT, fy(2022), 999.0)
                .with(TOTAL_DEBT, fy(2023), 300.0)
                .with(CASH_AND_EQUIVALENTS, fy(2023), 120.0),
            cash_flow: StatementTable::new()
                .with(OPERATING_CASH_FLOW, fy(2022), 1.0)
                .with(OPERATING_CASH_FLOW, fy(2023), 500.0)
                .with(PURCHASE_OF_PPE, fy(2023), -80.0),
        };

        let inputs = DcfInputs::from_statements(&annual, Some(10.0), Some(30.0)).unwrap();
        assert_eq!(inputs.base_fcf(), 420.0);
        assert_eq!(inputs.capex_source.as_deref(), Some(PURCHASE_OF_PPE));
        assert_eq!(inputs.net_cash(), -180.0);
    }

    #[test]
    fn test_capital_expenditure_preferred_over_ppe() {
        let annual = FinancialStatements {
            income: StatementTable::new(),
            balance_sheet: StatementTable::new().with(TOTAL_DEBT, fy(2023), 0.0),
            cash_flow: StatementTable::new()
                .with(OPERATING_CASH_FLOW, fy(2023), 500.0)
                .with(CAPITAL_EXPENDITURE, fy(2023), -100.0)
                .with(PURCHASE_OF_PPE, fy(2023), -80.0),
        };
        let inputs = DcfInputs::from_statements(&annual, None, None).unwrap();
        assert_eq!(inputs.capex, 100.0);
        assert_eq!(inputs.capex_source.as_deref(), Some(CAPITAL_EXPENDITURE));
    }

    #[test]
    fn test_missing_operating_cash_flow_is_unavailable() {
        let annual = FinancialStatements {
            income: StatementTable::new(),
            balance_sheet: StatementTable::new().with(TOTAL_DEBT, fy(2023), 10.0),
            cash_flow: StatementTable::new().with(CAPITAL_EXPENDITURE, fy(2023), -100.0),
        };
        assert!(matches!(
            DcfInputs::from_statements(&annual, Some(1.0), None),
            Err(AnalysisError::MissingData(_))
        ));

        let empty = FinancialStatements::default();
        assert!(DcfInputs::from_statements(&empty, Some(1.0), None).is_err());
    }
}
