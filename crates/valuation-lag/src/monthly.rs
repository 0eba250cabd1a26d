//! Monthly alignment of quarterly data.
//!
//! Every builder here walks the months in order with a single forward-moving
//! quarter pointer: a month takes the latest quarter whose fiscal end date is on
//! or before it, and months before the first quarter take the first one.

use analysis_core::{BalanceSheet, MonthlyPricePoint};
use chrono::NaiveDate;

/// Index of the governing quarter for each month.
fn forward_scan(anchors: &[NaiveDate], months: &[NaiveDate]) -> Vec<usize> {
    let mut current = 0;
    months
        .iter()
        .map(|month| {
            while current + 1 < anchors.len() && *month >= anchors[current + 1] {
                current += 1;
            }
            current
        })
        .collect()
}

/// Spread a quarterly series over months.
///
/// `anchors[i]` is the fiscal date of `values[i]`. Empty when `values` is empty.
pub fn forward_fill(values: &[f64], anchors: &[NaiveDate], months: &[NaiveDate]) -> Vec<f64> {
    if values.is_empty() || anchors.is_empty() {
        return Vec::new();
    }
    forward_scan(anchors, months)
        .into_iter()
        .map(|idx| values.get(idx).or(values.last()).copied().unwrap_or(0.0))
        .collect()
}

/// Enterprise value per month: latest share count times the month's price,
/// plus debt and less liquid assets of the governing balance sheet.
///
/// Empty when there are no balance sheets.
pub fn monthly_enterprise_value(prices: &[MonthlyPricePoint], balance: &[BalanceSheet]) -> Vec<f64> {
    let Some(latest) = balance.last() else {
        return Vec::new();
    };
    let shares = latest.shares_outstanding;
    let anchors: Vec<NaiveDate> = balance.iter().map(|b| b.fiscal_date_ending).collect();
    let months: Vec<NaiveDate> = prices.iter().map(|p| p.date).collect();

    prices
        .iter()
        .zip(forward_scan(&anchors, &months))
        .map(|(point, idx)| {
            let sheet = &balance[idx];
            shares * point.price() + sheet.total_debt() - sheet.liquid_assets()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn month(s: &str, price: f64) -> MonthlyPricePoint {
        MonthlyPricePoint {
            date: date(s),
            open: 0.0,
            high: 0.0,
            low: 0.0,
            close: price,
            adjusted_close: price,
            volume: 0.0,
            dividend: 0.0,
        }
    }

    fn sheet(s: &str, debt: f64, cash: f64, shares: f64) -> BalanceSheet {
        BalanceSheet {
            fiscal_date_ending: date(s),
            total_assets: 0.0,
            total_current_assets: 0.0,
            total_current_liabilities: 0.0,
            short_term_debt: 0.0,
            current_debt: 0.0,
            long_term_debt: 0.0,
            short_long_term_debt_total: debt,
            cash_and_equivalents: cash,
            short_term_investments: 0.0,
            shares_outstanding: shares,
        }
    }

    #[test]
    fn test_forward_fill() {
        let anchors = [date("2024-03-31"), date("2024-06-30")];
        let months = [
            date("2024-01-31"),
            date("2024-03-31"),
            date("2024-05-31"),
            date("2024-06-30"),
            date("2024-09-30"),
        ];
        assert_eq!(forward_fill(&[1.0, 2.0], &anchors, &months), vec![1.0, 1.0, 1.0, 2.0, 2.0]);
        assert!(forward_fill(&[], &anchors, &months).is_empty());
    }

    #[test]
    fn test_monthly_enterprise_value() {
        let balance = [sheet("2024-03-31", 100.0, 40.0, 5.0), sheet("2024-06-30", 200.0, 40.0, 10.0)];
        let prices = [month("2024-02-29", 2.0), month("2024-04-30", 3.0), month("2024-07-31", 4.0)];
        let ev = monthly_enterprise_value(&prices, &balance);
        // Latest share count (10) applies to every month
        assert_eq!(ev, vec![20.0 + 60.0, 30.0 + 60.0, 40.0 + 160.0]);

        assert!(monthly_enterprise_value(&prices, &[]).is_empty());
    }
}
