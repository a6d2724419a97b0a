//! Statement line-item names as the market-data provider spells them.

pub const DILUTED_EPS: &str = "Diluted EPS";
pub const BASIC_EPS: &str = "Basic EPS";

pub const OPERATING_INCOME: &str = "Operating Income";
pub const TAX_PROVISION: &str = "Tax Provision";
pub const PRETAX_INCOME: &str = "Pretax Income";

pub const STOCKHOLDERS_EQUITY: &str = "Stockholders Equity";
pub const TOTAL_DEBT: &str = "Total Debt";
pub const CASH_AND_EQUIVALENTS: &str = "Cash And Cash Equivalents";

pub const OPERATING_CASH_FLOW: &str = "Operating Cash Flow";
pub const CAPITAL_EXPENDITURE: &str = "Capital Expenditure";
pub const PURCHASE_OF_PPE: &str = "Purchase Of PPE";

/// EPS rows in the order they are tried.
pub const EPS_CANDIDATES: &[&str] = &[DILUTED_EPS, BASIC_EPS];

/// CapEx rows in the order they are tried.
pub const CAPEX_CANDIDATES: &[&str] = &[CAPITAL_EXPENDITURE, PURCHASE_OF_PPE];
