//! Balance-sheet risk: leverage, interest coverage, liquidity and debt trend.

use analysis_core::stats::{rolling_window, slope};
use analysis_core::ttm::ttm;
use analysis_core::{BalanceSheet, IncomeStatement};
use serde::{Deserialize, Serialize};

/// Net debt / EBITDA reported when EBITDA is non-positive and net debt is positive.
pub const MAX_LEVERAGE: f64 = 10.0;

/// Coverage reported when there is no interest expense.
pub const UNCAPPED_COVERAGE: f64 = 999.0;

/// Leverage at or below which only deleveraging trends are scored.
pub const LOW_LEVERAGE_REGIME: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskState {
    LowRisk,
    Moderate,
    HighRisk,
}

impl RiskState {
    pub fn from_total(total: i32) -> Self {
        if total >= 3 {
            RiskState::LowRisk
        } else if total >= 0 {
            RiskState::Moderate
        } else {
            RiskState::HighRisk
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheetRisk {
    pub leverage_score: i32,
    pub coverage_score: i32,
    pub liquidity_score: i32,
    pub debt_trend_score: i32,
    pub total_score: i32,
    pub state: RiskState,
    #[serde(rename = "latestNetDebtToEBITDA")]
    pub latest_net_debt_to_ebitda: f64,
    pub latest_interest_coverage: f64,
    pub latest_current_ratio: f64,
    pub debt_trend_slope: f64,
    /// Windowed net debt / EBITDA series the trend was fitted on.
    #[serde(rename = "netDebtToEBITDA")]
    pub net_debt_to_ebitda: Vec<f64>,
}

impl BalanceSheetRisk {
    /// Score ascending balance sheets and income statements over the trailing window.
    pub fn compute(balance: &[BalanceSheet], income: &[IncomeStatement], window_size: usize) -> Self {
        if balance.is_empty() {
            tracing::warn!("No balance sheets available; leverage and liquidity default to zero");
        }

        let net_debt: Vec<f64> = balance.iter().map(BalanceSheet::net_debt).collect();
        let ebitda_ttm = ttm(&income.iter().map(|q| q.ebitda).collect::<Vec<_>>());

        let aligned_net_debt = rolling_window(&net_debt, ebitda_ttm.len());
        let net_debt_window = rolling_window(aligned_net_debt, window_size);
        let ebitda_window = rolling_window(&ebitda_ttm, window_size);
        let net_debt_to_ebitda = leverage_series(net_debt_window, ebitda_window);
        let latest_net_debt_to_ebitda = net_debt_to_ebitda.last().copied().unwrap_or(0.0);

        let latest_interest_coverage = interest_coverage(income);
        let latest_current_ratio = balance.last().map_or(0.0, current_ratio);
        let debt_trend_slope = slope(&net_debt_to_ebitda);

        let leverage_score = leverage_score(latest_net_debt_to_ebitda);
        let coverage_score = coverage_score(latest_interest_coverage);
        let liquidity_score = liquidity_score(latest_current_ratio);
        let debt_trend_score = debt_trend_score(latest_net_debt_to_ebitda, debt_trend_slope);

        let total_score = leverage_score + coverage_score + liquidity_score + debt_trend_score;

        tracing::debug!(
            leverage = latest_net_debt_to_ebitda,
            coverage = latest_interest_coverage,
            current_ratio = latest_current_ratio,
            trend = debt_trend_slope,
            total = total_score,
            "Balance sheet risk scored"
        );

        Self {
            leverage_score,
            coverage_score,
            liquidity_score,
            debt_trend_score,
            total_score,
            state: RiskState::from_total(total_score),
            latest_net_debt_to_ebitda,
            latest_interest_coverage,
            latest_current_ratio,
            debt_trend_slope,
            net_debt_to_ebitda,
        }
    }
}

/// Pair net debt with TTM EBITDA from the most recent position backwards.
pub fn leverage_series(net_debt: &[f64], ebitda_ttm: &[f64]) -> Vec<f64> {
    let len = net_debt.len().min(ebitda_ttm.len());
    rolling_window(net_debt, len)
        .iter()
        .zip(rolling_window(ebitda_ttm, len))
        .map(|(nd, ebitda)| {
            if *ebitda <= 0.0 {
                if *nd > 0.0 {
                    MAX_LEVERAGE
                } else {
                    0.0
                }
            } else {
                nd / ebitda
            }
        })
        .collect()
}

/// Latest TTM operating income over TTM absolute interest expense.
pub fn interest_coverage(income: &[IncomeStatement]) -> f64 {
    let operating_income: Vec<f64> = income.iter().map(|q| q.operating_income).collect();
    let interest: Vec<f64> = income.iter().map(|q| q.interest_expense.abs()).collect();
    match (ttm(&operating_income).last(), ttm(&interest).last()) {
        (Some(_), Some(ie)) if *ie == 0.0 => UNCAPPED_COVERAGE,
        (Some(oi), Some(ie)) => oi / ie,
        _ => 0.0,
    }
}

pub fn current_ratio(sheet: &BalanceSheet) -> f64 {
    let assets = sheet.total_current_assets;
    let liabilities = sheet.total_current_liabilities;
    if liabilities == 0.0 {
        if assets > 0.0 {
            3.0
        } else {
            1.0
        }
    } else {
        assets / liabilities
    }
}

pub fn leverage_score(net_debt_to_ebitda: f64) -> i32 {
    if net_debt_to_ebitda < 1.0 {
        2
    } else if net_debt_to_ebitda < 2.0 {
        1
    } else if net_debt_to_ebitda < 3.0 {
        0
    } else if net_debt_to_ebitda < 4.0 {
        -1
    } else {
        -2
    }
}

pub fn coverage_score(coverage: f64) -> i32 {
    if coverage > 10.0 {
        2
    } else if coverage > 5.0 {
        1
    } else if coverage > 2.0 {
        0
    } else if coverage > 1.0 {
        -1
    } else {
        -2
    }
}

pub fn liquidity_score(current_ratio: f64) -> i32 {
    if current_ratio > 1.5 {
        2
    } else if current_ratio > 1.1 {
        1
    } else if current_ratio > 0.8 {
        0
    } else {
        -1
    }
}

/// Near-net-cash companies are only rewarded for a steep deleveraging trend.
pub fn debt_trend_score(latest_net_debt_to_ebitda: f64, trend_slope: f64) -> i32 {
    if latest_net_debt_to_ebitda <= LOW_LEVERAGE_REGIME {
        if trend_slope < -0.05 {
            1
        } else {
            0
        }
    } else if trend_slope < -0.02 {
        1
    } else if trend_slope > 0.02 {
        -1
    } else {
        0
    }
}
