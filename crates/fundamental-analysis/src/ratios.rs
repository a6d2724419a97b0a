use analysis_core::format::{format_big_number, format_metric};
use analysis_core::line_items::{OPERATING_INCOME, PRETAX_INCOME, STOCKHOLDERS_EQUITY, TAX_PROVISION, TOTAL_DEBT};
use analysis_core::stats::{pct_change, std_dev};
use analysis_core::{FinancialStatements, FundamentalsSnapshot};
use serde::{Deserialize, Serialize};

/// Trading periods per window
pub const WEEK_PERIODS: usize = 5;
pub const MONTH_PERIODS: usize = 21;
pub const YEAR_PERIODS: usize = 252;

/// Minimum bar count (exclusive) before volatility is reported
const MIN_VOLATILITY_BARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ratio {
    MarketCap,
    Income,
    Sales,
    BookPerShare,
    CashPerShare,
    DividendYield,
    Recommendation,
    TrailingPe,
    ForwardPe,
    Peg,
    PriceToSales,
    PriceToBook,
    PriceToCash,
    PriceToFcf,
    QuickRatio,
    CurrentRatio,
    DebtToEquity,
    Roa,
    Roe,
    Roic,
    GrossMargin,
    OperatingMargin,
    ProfitMargin,
    Payout,
    InsiderOwnership,
    InstitutionalOwnership,
    PerfWeek,
    PerfMonth,
    PerfYear,
    Volatility,
    Beta,
    PrevClose,
    Price,
}

impl Ratio {
    pub fn label(&self) -> &'static str {
        match self {
            Ratio::MarketCap => "Market Cap",
            Ratio::Income => "Income",
            Ratio::Sales => "Sales",
            Ratio::BookPerShare => "Book/sh",
            Ratio::CashPerShare => "Cash/sh",
            Ratio::DividendYield => "Dividend",
            Ratio::Recommendation => "Recom",
            Ratio::TrailingPe => "P/E",
            Ratio::ForwardPe => "Forward P/E",
            Ratio::Peg => "PEG",
            Ratio::PriceToSales => "P/S",
            Ratio::PriceToBook => "P/B",
            Ratio::PriceToCash => "P/C",
            Ratio::PriceToFcf => "P/FCF",
            Ratio::QuickRatio => "Quick Ratio",
            Ratio::CurrentRatio => "Current Ratio",
            Ratio::DebtToEquity => "Debt/Eq",
            Ratio::Roa => "ROA",
            Ratio::Roe => "ROE",
            Ratio::Roic => "ROIC",
            Ratio::GrossMargin => "Gross Margin",
            Ratio::OperatingMargin => "Oper. Margin",
            Ratio::ProfitMargin => "Profit Margin",
            Ratio::Payout => "Payout",
            Ratio::InsiderOwnership => "Insider Own",
            Ratio::InstitutionalOwnership => "Inst Own",
            Ratio::PerfWeek => "Perf Week",
            Ratio::PerfMonth => "Perf Month",
            Ratio::PerfYear => "Perf Year",
            Ratio::Volatility => "Volatility",
            Ratio::Beta => "Beta",
            Ratio::PrevClose => "Prev Close",
            Ratio::Price => "Price",
        }
    }

    /// Good/bad cut-offs for the ratio. Ratios not listed are never rated.
    pub fn threshold(&self) -> Threshold {
        use Bound::{Above, Below};
        let (good, bad) = match self {
            Ratio::Recommendation => (Some(Below(2.0)), Some(Above(3.0))),
            Ratio::TrailingPe => (Some(Below(15.0)), Some(Above(50.0))),
            Ratio::ForwardPe => (Some(Below(15.0)), None),
            Ratio::Peg => (Some(Below(1.0)), Some(Above(2.0))),
            Ratio::PriceToSales => (None, Some(Above(10.0))),
            Ratio::QuickRatio => (Some(Above(1.0)), Some(Below(0.5))),
            Ratio::CurrentRatio => (Some(Above(1.5)), None),
            // provider reports debt/equity in percent
            Ratio::DebtToEquity => (None, Some(Above(200.0))),
            Ratio::Roa => (Some(Above(0.15)), Some(Below(0.0))),
            Ratio::Roe => (Some(Above(0.20)), Some(Below(0.0))),
            Ratio::Roic => (Some(Above(0.15)), None),
            Ratio::GrossMargin => (Some(Above(0.4)), None),
            Ratio::OperatingMargin | Ratio::ProfitMargin => (Some(Above(0.2)), None),
            Ratio::PerfWeek | Ratio::PerfMonth | Ratio::PerfYear => (Some(Above(0.0)), Some(Below(0.0))),
            _ => (None, None),
        };
        Threshold { good, bad }
    }

    fn display(&self, value: Option<f64>) -> String {
        match self {
            Ratio::MarketCap | Ratio::Income | Ratio::Sales => format_big_number(value),
            Ratio::DividendYield
            | Ratio::Roa
            | Ratio::Roe
            | Ratio::Roic
            | Ratio::GrossMargin
            | Ratio::OperatingMargin
            | Ratio::ProfitMargin
            | Ratio::Payout
            | Ratio::InsiderOwnership
            | Ratio::InstitutionalOwnership => format_metric(value, 2, 100.0, "%"),
            Ratio::PerfWeek | Ratio::PerfMonth | Ratio::PerfYear | Ratio::Volatility => {
                format_metric(value, 2, 1.0, "%")
            }
            _ => format_metric(value, 2, 1.0, ""),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Bound {
    Above(f64),
    Below(f64),
}

impl Bound {
    fn holds(&self, value: f64) -> bool {
        match *self {
            Bound::Above(limit) => value > limit,
            Bound::Below(limit) => value < limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub good: Option<Bound>,
    pub bad: Option<Bound>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Good,
    Bad,
    Neutral,
}

impl Threshold {
    /// Zero reads as "not reported" and is never rated.
    pub fn rate(&self, value: Option<f64>) -> Rating {
        let v = match value {
            Some(v) if v != 0.0 && v.is_finite() => v,
            _ => return Rating::Neutral,
        };
        if self.good.is_some_and(|b| b.holds(v)) {
            Rating::Good
        } else if self.bad.is_some_and(|b| b.holds(v)) {
            Rating::Bad
        } else {
            Rating::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioEntry {
    pub ratio: Ratio,
    pub label: String,
    pub value: Option<f64>,
    pub rating: Rating,
    pub display: String,
}

/// Ratio name -> (value or undefined, rating), in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioSheet {
    pub entries: Vec<RatioEntry>,
}

impl RatioSheet {
    fn push(&mut self, ratio: Ratio, value: Option<f64>) {
        let value = value.filter(|v| v.is_finite());
        self.entries.push(RatioEntry {
            ratio,
            label: ratio.label().to_string(),
            value,
            rating: ratio.threshold().rate(value),
            display: ratio.display(value),
        });
    }

    pub fn entry(&self, ratio: Ratio) -> Option<&RatioEntry> {
        self.entries.iter().find(|e| e.ratio == ratio)
    }

    pub fn get(&self, ratio: Ratio) -> Option<f64> {
        self.entry(ratio).and_then(|e| e.value)
    }
}

fn divide(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

pub fn cash_per_share(snapshot: &FundamentalsSnapshot) -> Option<f64> {
    divide(snapshot.total_cash, snapshot.shares_outstanding)
}

pub fn price_to_cash(snapshot: &FundamentalsSnapshot) -> Option<f64> {
    divide(snapshot.market_cap, snapshot.total_cash)
}

pub fn price_to_fcf(snapshot: &FundamentalsSnapshot) -> Option<f64> {
    divide(snapshot.market_cap, snapshot.free_cash_flow)
}

/// Return on invested capital from the latest annual statements.
///
/// Effective tax rate is tax provision over pretax income (a missing
/// provision counts as zero), or `fallback_tax_rate` when pretax income is
/// missing or zero. Total debt defaults to zero.
pub fn roic(annual: &FinancialStatements, fallback_tax_rate: f64) -> Option<f64> {
    let operating_income = annual.income.latest(OPERATING_INCOME).filter(|v| *v != 0.0)?;
    let equity = annual.balance_sheet.latest(STOCKHOLDERS_EQUITY).filter(|v| *v != 0.0)?;
    let debt = annual.balance_sheet.latest(TOTAL_DEBT).unwrap_or(0.0);

    let tax_rate = match annual.income.latest(PRETAX_INCOME) {
        Some(pretax) if pretax != 0.0 => annual.income.latest(TAX_PROVISION).unwrap_or(0.0) / pretax,
        _ => fallback_tax_rate,
    };

    let nopat = operating_income * (1.0 - tax_rate);
    let invested_capital = equity + debt;
    if invested_capital > 0.0 {
        Some(nopat / invested_capital)
    } else {
        None
    }
}

/// Percent change of the last close against the close `periods` bars
/// earlier. Undefined with fewer than `periods + 1` closes.
pub fn performance(closes: &[f64], periods: usize) -> Option<f64> {
    if closes.len() < periods + 1 {
        return None;
    }
    let current = closes[closes.len() - 1];
    let base = closes[closes.len() - 1 - periods];
    if base == 0.0 {
        return None;
    }
    Some((current / base - 1.0) * 100.0)
}

/// Annualized volatility in percent: sample standard deviation of daily
/// returns scaled by sqrt(252). Needs more than 20 closes.
pub fn volatility(closes: &[f64]) -> Option<f64> {
    if closes.len() <= MIN_VOLATILITY_BARS {
        return None;
    }
    let returns = pct_change(closes);
    std_dev(&returns).map(|sd| sd * (YEAR_PERIODS as f64).sqrt() * 100.0)
}

/// Full ratio sheet for one ticker.
pub fn compute_ratios(
    snapshot: &FundamentalsSnapshot,
    annual: &FinancialStatements,
    closes: &[f64],
    fallback_tax_rate: f64,
) -> RatioSheet {
    let s = snapshot;
    let mut sheet = RatioSheet::default();

    sheet.push(Ratio::MarketCap, s.market_cap);
    sheet.push(Ratio::Income, s.net_income_to_common);
    sheet.push(Ratio::Sales, s.total_revenue);
    sheet.push(Ratio::BookPerShare, s.book_value);
    sheet.push(Ratio::CashPerShare, cash_per_share(s));
    sheet.push(Ratio::DividendYield, s.dividend_yield);

    sheet.push(Ratio::Recommendation, s.recommendation_mean);
    sheet.push(Ratio::TrailingPe, s.trailing_pe);
    sheet.push(Ratio::ForwardPe, s.forward_pe);

    sheet.push(Ratio::Peg, s.peg_ratio.or(s.trailing_peg_ratio));
    sheet.push(Ratio::PriceToSales, s.price_to_sales);
    sheet.push(Ratio::PriceToBook, s.price_to_book);
    sheet.push(Ratio::PriceToCash, price_to_cash(s));
    sheet.push(Ratio::PriceToFcf, price_to_fcf(s));
    sheet.push(Ratio::QuickRatio, s.quick_ratio);
    sheet.push(Ratio::CurrentRatio, s.current_ratio);

    sheet.push(Ratio::DebtToEquity, s.debt_to_equity);
    sheet.push(Ratio::Roa, s.return_on_assets);
    sheet.push(Ratio::Roe, s.return_on_equity);
    sheet.push(Ratio::Roic, roic(annual, fallback_tax_rate));
    sheet.push(Ratio::GrossMargin, s.gross_margins);

    sheet.push(Ratio::OperatingMargin, s.operating_margins);
    sheet.push(Ratio::ProfitMargin, s.profit_margins);
    sheet.push(Ratio::Payout, s.payout_ratio);
    sheet.push(Ratio::InsiderOwnership, s.held_percent_insiders);
    sheet.push(Ratio::InstitutionalOwnership, s.held_percent_institutions);

    sheet.push(Ratio::PerfWeek, performance(closes, WEEK_PERIODS));
    sheet.push(Ratio::PerfMonth, performance(closes, MONTH_PERIODS));
    sheet.push(Ratio::PerfYear, performance(closes, YEAR_PERIODS));
    sheet.push(Ratio::Volatility, volatility(closes));
    sheet.push(Ratio::Beta, s.beta);
    sheet.push(Ratio::PrevClose, s.previous_close);
    sheet.push(Ratio::Price, closes.last().copied());

    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::StatementTable;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn fy(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 12, 31).unwrap()
    }

    fn annual_statements(items: &[(&str, f64)], balance: &[(&str, f64)]) -> FinancialStatements {
        let income = items.iter().fold(StatementTable::new(), |t, (k, v)| t.with(k, fy(2023), *v));
        let balance_sheet = balance.iter().fold(StatementTable::new(), |t, (k, v)| t.with(k, fy(2023), *v));
        FinancialStatements {
            income,
            balance_sheet,
            cash_flow: StatementTable::new(),
        }
    }

    #[test]
    fn test_price_to_cash() {
        let snapshot = FundamentalsSnapshot {
            market_cap: Some(1000.0),
            total_cash: Some(200.0),
            ..Default::default()
        };
        assert_eq!(price_to_cash(&snapshot), Some(5.0));

        let no_cash = FundamentalsSnapshot { total_cash: Some(0.0), ..snapshot.clone() };
        assert_eq!(price_to_cash(&no_cash), None);

        let missing = FundamentalsSnapshot { total_cash: None, ..snapshot };
        assert_eq!(price_to_cash(&missing), None);
    }

    #[test]
    fn test_cash_per_share_requires_shares() {
        let snapshot = FundamentalsSnapshot {
            total_cash: Some(500.0),
            shares_outstanding: Some(0.0),
            free_cash_flow: Some(50.0),
            market_cap: Some(1500.0),
            ..Default::default()
        };
        assert_eq!(cash_per_share(&snapshot), None);
        assert_eq!(price_to_fcf(&snapshot), Some(30.0));
    }

    #[test]
    fn test_performance_windows() {
        let ten: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        // close[t-5] = 5, current = 10
        assert_relative_eq!(performance(&ten, WEEK_PERIODS).unwrap(), 100.0);
        assert_eq!(performance(&ten[..4], WEEK_PERIODS), None);
        // exactly N + 1 closes is enough
        assert_relative_eq!(performance(&ten[..6], WEEK_PERIODS).unwrap(), 500.0);
        assert_eq!(performance(&ten, MONTH_PERIODS), None);
    }

    #[test]
    fn test_volatility_needs_more_than_twenty_closes() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i % 3) as f64).collect();
        assert_eq!(volatility(&closes), None);

        let mut longer = closes.clone();
        longer.push(101.0);
        let returns = pct_change(&longer);
        let expected = std_dev(&returns).unwrap() * 252f64.sqrt() * 100.0;
        assert_relative_eq!(volatility(&longer).unwrap(), expected);
    }

    #[test]
    fn test_volatility_flat_prices() {
        assert_eq!(volatility(&[50.0; 30]), Some(0.0));
    }

    #[test]
    fn test_roic_effective_tax_rate() {
        let annual = annual_statements(
            &[(OPERATING_INCOME, 200.0), (TAX_PROVISION, 25.0), (PRETAX_INCOME, 100.0)],
            &[(STOCKHOLDERS_EQUITY, 600.0), (TOTAL_DEBT, 400.0)],
        );
        // tax 25%, NOPAT 150, invested capital 1000
        assert_relative_eq!(roic(&annual, 0.21).unwrap(), 0.15);
    }

    #[test]
    fn test_roic_fallback_tax_and_missing_debt() {
        let annual = annual_statements(
            &[(OPERATING_INCOME, 100.0), (PRETAX_INCOME, 0.0)],
            &[(STOCKHOLDERS_EQUITY, 500.0)],
        );
        assert_relative_eq!(roic(&annual, 0.21).unwrap(), 79.0 / 500.0, max_relative = 1e-12);
    }

    #[test]
    fn test_roic_undefined_cases() {
        let no_equity = annual_statements(&[(OPERATING_INCOME, 100.0)], &[]);
        assert_eq!(roic(&no_equity, 0.21), None);

        let negative_capital = annual_statements(
            &[(OPERATING_INCOME, 100.0)],
            &[(STOCKHOLDERS_EQUITY, -300.0), (TOTAL_DEBT, 100.0)],
        );
        assert_eq!(roic(&negative_capital, 0.21), None);

        let no_income = annual_statements(&[], &[(STOCKHOLDERS_EQUITY, 500.0)]);
        assert_eq!(roic(&no_income, 0.21), None);
    }

    #[test]
    fn test_threshold_ratings() {
        assert_eq!(Ratio::TrailingPe.threshold().rate(Some(12.0)), Rating::Good);
        assert_eq!(Ratio::TrailingPe.threshold().rate(Some(30.0)), Rating::Neutral);
        assert_eq!(Ratio::TrailingPe.threshold().rate(Some(60.0)), Rating::Bad);
        assert_eq!(Ratio::QuickRatio.threshold().rate(Some(0.3)), Rating::Bad);
        assert_eq!(Ratio::Roe.threshold().rate(Some(-0.1)), Rating::Bad);
        assert_eq!(Ratio::PerfWeek.threshold().rate(Some(0.0)), Rating::Neutral);
        assert_eq!(Ratio::PriceToBook.threshold().rate(Some(0.5)), Rating::Neutral);
        assert_eq!(Ratio::Peg.threshold().rate(None), Rating::Neutral);
    }

    #[test]
    fn test_compute_ratios_sheet() {
        let snapshot = FundamentalsSnapshot {
            market_cap: Some(2.5e12),
            total_cash: Some(5.0e10),
            shares_outstanding: Some(1.0e10),
            trailing_pe: Some(28.4),
            trailing_peg_ratio: Some(0.8),
            return_on_equity: Some(0.253),
            ..Default::default()
        };
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let sheet = compute_ratios(&snapshot, &FinancialStatements::default(), &closes, 0.21);

        assert_eq!(sheet.get(Ratio::PriceToCash), Some(50.0));
        assert_eq!(sheet.get(Ratio::CashPerShare), Some(5.0));
        assert_eq!(sheet.get(Ratio::Peg), Some(0.8));
        assert_eq!(sheet.entry(Ratio::Peg).unwrap().rating, Rating::Good);
        assert_eq!(sheet.get(Ratio::Roic), None);
        assert_eq!(sheet.entry(Ratio::Roic).unwrap().display, "N/A");
        assert_eq!(sheet.entry(Ratio::MarketCap).unwrap().display, "2.50T");
        assert_eq!(sheet.entry(Ratio::Roe).unwrap().display, "25.30%");
        assert_eq!(sheet.get(Ratio::Price), Some(129.0));
        assert!(sheet.get(Ratio::PerfWeek).unwrap() > 0.0);
        assert_eq!(sheet.get(Ratio::PerfYear), None);
        assert_eq!(sheet.entry(Ratio::PerfYear).unwrap().rating, Rating::Neutral);
    }

    #[test]
    fn test_peg_prefers_primary_field() {
        let snapshot = FundamentalsSnapshot {
            peg_ratio: Some(2.4),
            trailing_peg_ratio: Some(0.8),
            ..Default::default()
        };
        let sheet = compute_ratios(&snapshot, &FinancialStatements::default(), &[], 0.21);
        assert_eq!(sheet.get(Ratio::Peg), Some(2.4));
        assert_eq!(sheet.entry(Ratio::Peg).unwrap().rating, Rating::Bad);
    }
}
