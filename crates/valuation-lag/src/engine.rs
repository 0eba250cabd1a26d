use analysis_core::stats::{rolling_window, rolling_z_score, slope};
use analysis_core::{BalanceSheet, DatedSeries, MonthlyPricePoint};
use chrono::NaiveDate;
use fundamental_analysis::FundamentalSeries;
use serde::{Deserialize, Serialize};

use crate::monthly::{forward_fill, monthly_enterprise_value};
use crate::multiple::{guarded_multiples, log_multiples, ValuationPhase};
use crate::regression::{detect_bottoms, rolling_residuals, BOTTOM_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValuationState {
    SignificantUndervaluation,
    Undervalued,
    FairValue,
    Overvalued,
    SignificantOvervaluation,
}

impl ValuationState {
    /// Negative scores mean price sits below what fundamentals justify.
    pub fn from_score(score: f64) -> Self {
        if score < -1.5 {
            ValuationState::SignificantUndervaluation
        } else if score < -0.5 {
            ValuationState::Undervalued
        } else if score > 1.5 {
            ValuationState::SignificantOvervaluation
        } else if score > 0.5 {
            ValuationState::Overvalued
        } else {
            ValuationState::FairValue
        }
    }
}

/// Month-by-month working series, all the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyValuation {
    pub dates: Vec<NaiveDate>,
    pub prices: Vec<f64>,
    pub enterprise_value: Vec<f64>,
    pub fundamental_basis: Vec<f64>,
    pub multiple: Vec<f64>,
    pub log_multiple: Vec<f64>,
    pub fundamental_composite: Vec<f64>,
    pub residuals: Vec<f64>,
    pub z_scores: Vec<f64>,
    pub bottoms: Vec<bool>,
}

impl MonthlyValuation {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationLag {
    /// Latest rolling z-score of the decoupling residual.
    pub score: f64,
    pub state: ValuationState,
    pub phase: ValuationPhase,
    pub multiple_label: String,
    pub multiple_slope: f64,
    pub fundamental_slope: f64,
    pub penalty_multiple: f64,
    pub window_months: usize,
    pub months: MonthlyValuation,
}

/// Quarterly fundamental composite, anchored to the YoY growth dates.
///
/// Profitable: `0.35 growth + 0.25 margin + 0.20 ROIC + 0.20 FCF margin`.
/// Unprofitable: `0.4 growth + 0.3 margin + 0.3 FCF margin`. Missing or
/// non-finite components count as 0.
pub fn fundamental_composite(series: &FundamentalSeries, phase: ValuationPhase) -> DatedSeries {
    let (margins, roic, fcf_margins) = series.aligned_to_growth();
    let component = |values: &[f64], i: usize| values.get(i).copied().filter(|v| v.is_finite()).unwrap_or(0.0);

    let composite = series
        .yoy_growth
        .values
        .iter()
        .enumerate()
        .map(|(i, growth)| {
            let growth = if growth.is_finite() { *growth } else { 0.0 };
            match phase {
                ValuationPhase::Profitable => {
                    0.35 * growth
                        + 0.25 * component(margins, i)
                        + 0.20 * component(roic, i)
                        + 0.20 * component(fcf_margins, i)
                }
                ValuationPhase::Unprofitable => {
                    0.4 * growth + 0.3 * component(margins, i) + 0.3 * component(fcf_margins, i)
                }
            }
        })
        .collect();

    DatedSeries {
        dates: series.yoy_growth.dates.clone(),
        values: composite,
    }
}

/// Price-versus-fundamentals decoupling over monthly history.
#[derive(Debug, Clone)]
pub struct ValuationLagEngine {
    window_months: usize,
}

impl ValuationLagEngine {
    /// `window_months` drives both the rolling regression and the rolling z-score.
    pub fn new(window_months: usize) -> Self {
        Self {
            window_months: window_months.max(2),
        }
    }

    pub fn window_months(&self) -> usize {
        self.window_months
    }

    /// Score ascending prices against ascending balance sheets and the derived series.
    pub fn compute(
        &self,
        prices: &[MonthlyPricePoint],
        balance: &[BalanceSheet],
        series: &FundamentalSeries,
    ) -> ValuationLag {
        let phase = ValuationPhase::from_latest_ebitda(series.latest_ebitda_ttm());
        let composite = fundamental_composite(series, phase);

        let (months, penalty_multiple) = self.monthly_series(prices, balance, series, phase, &composite);

        let score = months.z_scores.last().copied().unwrap_or(0.0);
        let multiple_slope = slope(rolling_window(&months.multiple, self.window_months));
        let fundamental_slope = slope(rolling_window(&months.fundamental_composite, self.window_months));

        tracing::debug!(
            phase = phase.multiple_label(),
            months = months.len(),
            penalty = penalty_multiple,
            score,
            "Valuation lag computed"
        );

        ValuationLag {
            score,
            state: ValuationState::from_score(score),
            phase,
            multiple_label: phase.multiple_label().to_string(),
            multiple_slope,
            fundamental_slope,
            penalty_multiple,
            window_months: self.window_months,
            months,
        }
    }

    fn monthly_series(
        &self,
        prices: &[MonthlyPricePoint],
        balance: &[BalanceSheet],
        series: &FundamentalSeries,
        phase: ValuationPhase,
        composite: &DatedSeries,
    ) -> (MonthlyValuation, f64) {
        if prices.is_empty() {
            tracing::warn!("No monthly prices; valuation lag is empty");
            return (MonthlyValuation::default(), 0.0);
        }
        if balance.is_empty() {
            tracing::warn!("No balance sheets; enterprise value unavailable");
            return (MonthlyValuation::default(), 0.0);
        }
        if composite.is_empty() {
            tracing::warn!(
                quarters = series.quarter_dates.len(),
                "Too few quarters for a fundamental composite; valuation lag is empty"
            );
            return (MonthlyValuation::default(), 0.0);
        }

        let dates: Vec<NaiveDate> = prices.iter().map(|p| p.date).collect();
        let enterprise_value = monthly_enterprise_value(prices, balance);

        let basis_quarterly = match phase {
            ValuationPhase::Profitable => &series.ebitda_ttm,
            ValuationPhase::Unprofitable => &series.revenue_ttm,
        };
        let fundamental_basis = forward_fill(&basis_quarterly.values, &basis_quarterly.dates, &dates);
        let guarded = guarded_multiples(&enterprise_value, &fundamental_basis, phase);
        let log_multiple = log_multiples(&guarded.values);
        let fundamental_composite = forward_fill(&composite.values, &composite.dates, &dates);

        let residuals = rolling_residuals(&fundamental_composite, &log_multiple, self.window_months);
        let z_scores = rolling_z_score(&residuals, self.window_months);
        let bottoms = detect_bottoms(&z_scores, BOTTOM_THRESHOLD);

        let months = MonthlyValuation {
            prices: prices.iter().map(MonthlyPricePoint::price).collect(),
            dates,
            enterprise_value,
            fundamental_basis,
            multiple: guarded.values,
            log_multiple,
            fundamental_composite,
            residuals,
            z_scores,
            bottoms,
        };
        (months, guarded.penalty)
    }
}
