use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schema::lenient_f64;

/// One fiscal quarter of income-statement line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatement {
    pub fiscal_date_ending: NaiveDate,
    #[serde(rename = "totalRevenue", default, deserialize_with = "lenient_f64")]
    pub revenue: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub operating_income: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ebitda: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub interest_expense: f64,
}

/// One fiscal quarter of cash-flow line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowStatement {
    pub fiscal_date_ending: NaiveDate,
    #[serde(rename = "operatingCashflow", default, deserialize_with = "lenient_f64")]
    pub operating_cash_flow: f64,
    #[serde(rename = "capitalExpenditures", default, deserialize_with = "lenient_f64")]
    pub capital_expenditure: f64,
}

impl CashFlowStatement {
    pub fn free_cash_flow(&self) -> f64 {
        self.operating_cash_flow - self.capital_expenditure
    }
}

/// One fiscal quarter of balance-sheet line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    pub fiscal_date_ending: NaiveDate,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_assets: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_current_assets: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_current_liabilities: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub short_term_debt: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_debt: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub long_term_debt: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub short_long_term_debt_total: f64,
    #[serde(
        rename = "cashAndCashEquivalentsAtCarryingValue",
        default,
        deserialize_with = "lenient_f64"
    )]
    pub cash_and_equivalents: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub short_term_investments: f64,
    #[serde(rename = "commonStockSharesOutstanding", default, deserialize_with = "lenient_f64")]
    pub shares_outstanding: f64,
}

impl BalanceSheet {
    /// Reported combined debt, or current + long-term debt when the combined field is absent.
    pub fn total_debt(&self) -> f64 {
        if self.short_long_term_debt_total != 0.0 {
            self.short_long_term_debt_total
        } else {
            self.current_debt + self.long_term_debt
        }
    }

    /// Cash plus short-term investments.
    pub fn liquid_assets(&self) -> f64 {
        self.cash_and_equivalents + self.short_term_investments
    }

    pub fn net_debt(&self) -> f64 {
        self.total_debt() - self.liquid_assets()
    }

    /// Interest-bearing short-term borrowings (`shortTermDebt`, else `currentDebt`).
    pub fn short_term_borrowings(&self) -> f64 {
        if self.short_term_debt != 0.0 {
            self.short_term_debt
        } else {
            self.current_debt
        }
    }

    /// Total assets less non-interest-bearing current liabilities.
    ///
    /// `None` when the result is not a positive finite amount.
    pub fn invested_capital(&self) -> Option<f64> {
        let nibcl = (self.total_current_liabilities - self.short_term_borrowings()).max(0.0);
        let capital = self.total_assets - nibcl;
        (capital.is_finite() && capital > 0.0).then_some(capital)
    }
}

/// One month of traded prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPricePoint {
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub open: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub high: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub low: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub close: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub adjusted_close: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub dividend: f64,
}

impl MonthlyPricePoint {
    /// Canonical price: adjusted close, falling back to close when absent or zero.
    pub fn price(&self) -> f64 {
        if self.adjusted_close != 0.0 {
            self.adjusted_close
        } else {
            self.close
        }
    }
}

/// Raw statement bundle for one entity, as supplied by the data collaborator.
///
/// Statement lists may arrive in any order; the orchestrator sorts them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFinancials {
    #[serde(default)]
    pub symbol: Option<String>,
    pub income_statements: Vec<IncomeStatement>,
    pub cash_flow_statements: Vec<CashFlowStatement>,
    pub balance_sheets: Vec<BalanceSheet>,
    pub monthly_prices: Vec<MonthlyPricePoint>,
}

/// All statement lines for one fiscal quarter, joined on the income-statement date.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterlyReport {
    pub fiscal_date_ending: NaiveDate,
    pub income: IncomeStatement,
    pub cash_flow: Option<CashFlowStatement>,
    pub balance: Option<BalanceSheet>,
}

impl QuarterlyReport {
    pub fn free_cash_flow(&self) -> f64 {
        self.cash_flow.as_ref().map_or(0.0, CashFlowStatement::free_cash_flow)
    }

    pub fn invested_capital(&self) -> Option<f64> {
        self.balance.as_ref().and_then(BalanceSheet::invested_capital)
    }
}

/// A derived series together with the quarter dates it is anchored to.
///
/// `dates[i]` is the fiscal date that produced `values[i]`; shortened series
/// (TTM, YoY) are anchored to the trailing dates of their source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatedSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl DatedSeries {
    /// Pair `values` with the trailing `values.len()` entries of `dates`.
    pub fn anchored(dates: &[NaiveDate], values: Vec<f64>) -> Self {
        let len = values.len().min(dates.len());
        let dates = dates[dates.len() - len..].to_vec();
        let values = values[values.len() - len..].to_vec();
        Self { dates, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn latest(&self) -> Option<(NaiveDate, f64)> {
        self.dates.last().copied().zip(self.values.last().copied())
    }
}

/// Named regime reported by a single trajectory pillar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PillarState {
    InsufficientData,
    // growth momentum
    ExplosiveAcceleration,
    Accelerating,
    Neutral,
    Decelerating,
    StructuralDeceleration,
    // margin dynamics
    Expanding,
    Compressing,
    // shared by margin, FCF and capital efficiency
    Stable,
    Improving,
    Deteriorating,
    // FCF only
    PersistentInflection,
}

impl PillarState {
    pub fn label(&self) -> &'static str {
        match self {
            PillarState::InsufficientData => "insufficient-data",
            PillarState::ExplosiveAcceleration => "explosive-acceleration",
            PillarState::Accelerating => "accelerating",
            PillarState::Neutral => "neutral",
            PillarState::Decelerating => "decelerating",
            PillarState::StructuralDeceleration => "structural-deceleration",
            PillarState::Expanding => "expanding",
            PillarState::Compressing => "compressing",
            PillarState::Stable => "stable",
            PillarState::Improving => "improving",
            PillarState::Deteriorating => "deteriorating",
            PillarState::PersistentInflection => "persistent-inflection",
        }
    }
}

/// Outcome of one trajectory pillar over its scoring window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarResult {
    pub score: i32,
    pub state: PillarState,
    pub slope: f64,
    pub window_values: Vec<f64>,
    /// Same length as `window_values`.
    pub regression_line: Vec<f64>,
}
