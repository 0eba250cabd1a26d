//! Derived quarterly series: TTM aggregates, growth, margins and ROIC.

use analysis_core::stats::rolling_window;
use analysis_core::ttm::{ttm, yoy_growth, TTM_OFFSET};
use analysis_core::{DatedSeries, QuarterlyReport};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// ROIC magnitudes beyond this are treated as data errors, not signal.
pub const MAX_ROIC_MAGNITUDE: f64 = 3.0;

/// Every series the trajectory and quality pillars consume, with its quarter anchor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundamentalSeries {
    pub quarter_dates: Vec<NaiveDate>,
    pub revenue_ttm: DatedSeries,
    pub operating_income_ttm: DatedSeries,
    pub fcf_ttm: DatedSeries,
    pub ebitda_ttm: DatedSeries,
    pub yoy_growth: DatedSeries,
    pub margins: DatedSeries,
    pub fcf_margins: DatedSeries,
    /// Non-finite where invested capital is invalid or the ratio is implausible.
    pub roic: DatedSeries,
}

impl FundamentalSeries {
    /// Build from quarters sorted oldest-first.
    pub fn from_quarters(quarters: &[QuarterlyReport]) -> Self {
        let dates: Vec<NaiveDate> = quarters.iter().map(|q| q.fiscal_date_ending).collect();

        let revenue: Vec<f64> = quarters.iter().map(|q| q.income.revenue).collect();
        let operating_income: Vec<f64> = quarters.iter().map(|q| q.income.operating_income).collect();
        let ebitda: Vec<f64> = quarters.iter().map(|q| q.income.ebitda).collect();
        let free_cash_flow: Vec<f64> = quarters.iter().map(QuarterlyReport::free_cash_flow).collect();
        let invested_capital: Vec<f64> = quarters
            .iter()
            .map(|q| q.invested_capital().unwrap_or(f64::NAN))
            .collect();

        let revenue_ttm = ttm(&revenue);
        let operating_income_ttm = ttm(&operating_income);
        let fcf_ttm = ttm(&free_cash_flow);
        let ebitda_ttm = ttm(&ebitda);

        let growth = yoy_growth(&revenue_ttm);
        let margins = ratio_to_revenue(&operating_income_ttm, &revenue_ttm);
        let fcf_margins = ratio_to_revenue(&fcf_ttm, &revenue_ttm);
        let roic = roic_series(&operating_income_ttm, &invested_capital);

        Self {
            revenue_ttm: DatedSeries::anchored(&dates, revenue_ttm),
            operating_income_ttm: DatedSeries::anchored(&dates, operating_income_ttm),
            fcf_ttm: DatedSeries::anchored(&dates, fcf_ttm),
            ebitda_ttm: DatedSeries::anchored(&dates, ebitda_ttm),
            yoy_growth: DatedSeries::anchored(&dates, growth),
            margins: DatedSeries::anchored(&dates, margins),
            fcf_margins: DatedSeries::anchored(&dates, fcf_margins),
            roic: DatedSeries::anchored(&dates, roic),
            quarter_dates: dates,
        }
    }

    /// Latest trailing EBITDA, 0 when fewer than four quarters exist.
    pub fn latest_ebitda_ttm(&self) -> f64 {
        self.ebitda_ttm.values.last().copied().unwrap_or(0.0)
    }

    /// Margin, ROIC and FCF-margin series cut to the YoY growth anchor so all
    /// four line up position-by-position.
    pub fn aligned_to_growth(&self) -> (&[f64], &[f64], &[f64]) {
        let len = self.yoy_growth.len();
        (
            rolling_window(&self.margins.values, len),
            rolling_window(&self.roic.values, len),
            rolling_window(&self.fcf_margins.values, len),
        )
    }
}

/// `numerator / revenue`, dividing by 1 when revenue is zero.
pub fn ratio_to_revenue(numerator: &[f64], revenue: &[f64]) -> Vec<f64> {
    numerator
        .iter()
        .zip(revenue)
        .map(|(n, r)| if *r == 0.0 { *n } else { n / r })
        .collect()
}

/// TTM operating income over invested capital aligned to the TTM anchor.
///
/// `invested_capital` is per quarter (NaN where invalid) and is shifted by
/// [`TTM_OFFSET`] to line up with the TTM series.
pub fn roic_series(operating_income_ttm: &[f64], invested_capital: &[f64]) -> Vec<f64> {
    let aligned = invested_capital.get(TTM_OFFSET..).unwrap_or(&[]);
    operating_income_ttm
        .iter()
        .enumerate()
        .map(|(i, oi)| {
            let capital = aligned.get(i).copied().unwrap_or(f64::NAN);
            if !capital.is_finite() || capital <= 0.0 {
                return f64::NAN;
            }
            let roic = oi / capital;
            if roic.abs() > MAX_ROIC_MAGNITUDE {
                f64::NAN
            } else {
                roic
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{BalanceSheet, CashFlowStatement, IncomeStatement};
    use approx::assert_abs_diff_eq;

    fn quarter(i: u32, revenue: f64, operating_income: f64, assets: f64) -> QuarterlyReport {
        let month = [3, 6, 9, 12][(i % 4) as usize];
        let day = if month == 6 || month == 9 { 30 } else { 31 };
        let date = NaiveDate::from_ymd_opt(2018 + (i / 4) as i32, month, day).unwrap();
        QuarterlyReport {
            fiscal_date_ending: date,
            income: IncomeStatement {
                fiscal_date_ending: date,
                revenue,
                operating_income,
                ebitda: operating_income * 1.2,
                interest_expense: 1.0,
            },
            cash_flow: Some(CashFlowStatement {
                fiscal_date_ending: date,
                operating_cash_flow: revenue * 0.3,
                capital_expenditure: revenue * 0.1,
            }),
            balance: Some(BalanceSheet {
                fiscal_date_ending: date,
                total_assets: assets,
                total_current_assets: 0.0,
                total_current_liabilities: 0.0,
                short_term_debt: 0.0,
                current_debt: 0.0,
                long_term_debt: 0.0,
                short_long_term_debt_total: 0.0,
                cash_and_equivalents: 0.0,
                short_term_investments: 0.0,
                shares_outstanding: 0.0,
            }),
        }
    }

    #[test]
    fn test_series_offsets_and_anchors() {
        let quarters: Vec<QuarterlyReport> = (0..10).map(|i| quarter(i, 100.0, 20.0, 400.0)).collect();
        let series = FundamentalSeries::from_quarters(&quarters);

        assert_eq!(series.revenue_ttm.len(), 7);
        assert_eq!(series.revenue_ttm.dates[0], quarters[3].fiscal_date_ending);
        assert_eq!(series.yoy_growth.len(), 3);
        assert_eq!(series.yoy_growth.dates[0], quarters[7].fiscal_date_ending);

        assert_abs_diff_eq!(series.margins.values[0], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(series.fcf_margins.values[0], 0.2, epsilon = 1e-12);
        // 80 TTM operating income over 400 capital
        assert_abs_diff_eq!(series.roic.values[0], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(series.latest_ebitda_ttm(), 96.0, epsilon = 1e-9);

        let (margins, roic, fcf) = series.aligned_to_growth();
        assert_eq!(margins.len(), 3);
        assert_eq!(roic.len(), 3);
        assert_eq!(fcf.len(), 3);
    }

    #[test]
    fn test_zero_revenue_divides_by_one() {
        assert_eq!(ratio_to_revenue(&[5.0, 6.0], &[0.0, 3.0]), vec![5.0, 2.0]);
    }

    #[test]
    fn test_roic_rejects_invalid_capital_and_outliers() {
        let capital = [0.0, 0.0, 0.0, 100.0, f64::NAN, 10.0, -5.0];
        let roic = roic_series(&[20.0, 20.0, 50.0, 20.0], &capital);
        assert_abs_diff_eq!(roic[0], 0.2, epsilon = 1e-12);
        assert!(roic[1].is_nan());
        // 50 / 10 = 5 exceeds the plausibility cap
        assert!(roic[2].is_nan());
        assert!(roic[3].is_nan());
    }

    #[test]
    fn test_short_history_yields_empty_series() {
        let quarters: Vec<QuarterlyReport> = (0..3).map(|i| quarter(i, 100.0, 20.0, 400.0)).collect();
        let series = FundamentalSeries::from_quarters(&quarters);
        assert!(series.revenue_ttm.is_empty());
        assert!(series.roic.is_empty());
        assert_eq!(series.latest_ebitda_ttm(), 0.0);
    }
}
