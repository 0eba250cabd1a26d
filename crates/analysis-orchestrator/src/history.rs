//! Entry-point normalization: every list leaves here ascending, date-unique and
//! cut at the anchor date. Nothing downstream reorders input.

use std::collections::BTreeMap;

use analysis_core::{
    BalanceSheet, CashFlowStatement, CompanyFinancials, IncomeStatement, MonthlyPricePoint, QuarterlyReport,
};
use chrono::NaiveDate;

/// Ascending, anchored view of one entity's statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedHistory {
    pub income: Vec<IncomeStatement>,
    pub cash_flow: Vec<CashFlowStatement>,
    pub balance: Vec<BalanceSheet>,
    pub prices: Vec<MonthlyPricePoint>,
}

/// Sort by `key`, keep the last record per date, and drop anything after `anchor`.
fn ascending<T: Clone>(records: &[T], key: impl Fn(&T) -> NaiveDate, anchor: Option<NaiveDate>) -> Vec<T> {
    let by_date: BTreeMap<NaiveDate, T> = records
        .iter()
        .filter(|r| anchor.map_or(true, |cutoff| key(r) <= cutoff))
        .map(|r| (key(r), r.clone()))
        .collect();
    by_date.into_values().collect()
}

impl NormalizedHistory {
    pub fn new(financials: &CompanyFinancials, anchor: Option<NaiveDate>) -> Self {
        Self {
            income: ascending(&financials.income_statements, |r| r.fiscal_date_ending, anchor),
            cash_flow: ascending(&financials.cash_flow_statements, |r| r.fiscal_date_ending, anchor),
            balance: ascending(&financials.balance_sheets, |r| r.fiscal_date_ending, anchor),
            prices: ascending(&financials.monthly_prices, |r| r.date, anchor),
        }
    }

    /// One report per income-statement quarter, joined to the cash-flow and
    /// balance records with the same fiscal date.
    pub fn quarters(&self) -> Vec<QuarterlyReport> {
        let cash_flow: BTreeMap<NaiveDate, &CashFlowStatement> =
            self.cash_flow.iter().map(|c| (c.fiscal_date_ending, c)).collect();
        let balance: BTreeMap<NaiveDate, &BalanceSheet> =
            self.balance.iter().map(|b| (b.fiscal_date_ending, b)).collect();

        self.income
            .iter()
            .map(|income| {
                let date = income.fiscal_date_ending;
                QuarterlyReport {
                    fiscal_date_ending: date,
                    income: income.clone(),
                    cash_flow: cash_flow.get(&date).map(|c| (*c).clone()),
                    balance: balance.get(&date).map(|b| (*b).clone()),
                }
            })
            .collect()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        [
            self.income.last().map(|r| r.fiscal_date_ending),
            self.balance.last().map(|r| r.fiscal_date_ending),
            self.prices.last().map(|r| r.date),
        ]
        .into_iter()
        .flatten()
        .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn income(s: &str, revenue: f64) -> IncomeStatement {
        IncomeStatement {
            fiscal_date_ending: date(s),
            revenue,
            operating_income: 0.0,
            ebitda: 0.0,
            interest_expense: 0.0,
        }
    }

    fn cash_flow(s: &str) -> CashFlowStatement {
        CashFlowStatement {
            fiscal_date_ending: date(s),
            operating_cash_flow: 10.0,
            capital_expenditure: 4.0,
        }
    }

    fn bundle() -> CompanyFinancials {
        CompanyFinancials {
            symbol: Some("ACME".to_string()),
            // Newest first, as the provider delivers them
            income_statements: vec![
                income("2024-06-30", 3.0),
                income("2024-03-31", 2.0),
                income("2023-12-31", 1.0),
            ],
            cash_flow_statements: vec![cash_flow("2024-06-30"), cash_flow("2023-12-31")],
            balance_sheets: Vec::new(),
            monthly_prices: Vec::new(),
        }
    }

    #[test]
    fn test_sorted_ascending() {
        let history = NormalizedHistory::new(&bundle(), None);
        let dates: Vec<NaiveDate> = history.income.iter().map(|r| r.fiscal_date_ending).collect();
        assert_eq!(dates, vec![date("2023-12-31"), date("2024-03-31"), date("2024-06-30")]);
        assert_eq!(history.latest_date(), Some(date("2024-06-30")));
    }

    #[test]
    fn test_anchor_cuts_future_records() {
        let history = NormalizedHistory::new(&bundle(), Some(date("2024-03-31")));
        assert_eq!(history.income.len(), 2);
        assert_eq!(history.cash_flow.len(), 1);
    }

    #[test]
    fn test_duplicate_dates_keep_last() {
        let mut financials = bundle();
        financials.income_statements.push(income("2024-03-31", 9.0));
        let history = NormalizedHistory::new(&financials, None);
        assert_eq!(history.income.len(), 3);
        assert_eq!(history.income[1].revenue, 9.0);
    }

    #[test]
    fn test_quarter_join() {
        let history = NormalizedHistory::new(&bundle(), None);
        let quarters = history.quarters();
        assert_eq!(quarters.len(), 3);
        assert_eq!(quarters[0].free_cash_flow(), 6.0);
        // No cash-flow statement for Q1 2024
        assert!(quarters[1].cash_flow.is_none());
        assert_eq!(quarters[1].free_cash_flow(), 0.0);
        assert!(quarters[2].balance.is_none());
    }
}
