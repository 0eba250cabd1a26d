//! Final blend of the fundamental pillars against the valuation lag.

use serde::{Deserialize, Serialize};

pub const GROWTH_WEIGHT: f64 = 0.45;
pub const STRUCTURAL_WEIGHT: f64 = 0.35;
pub const BALANCE_WEIGHT: f64 = 0.20;
pub const FUNDAMENTAL_LEG: f64 = 0.5;
pub const VALUATION_LEG: f64 = 0.5;
pub const MIN_RISK_MULTIPLIER: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    StrongBuy,
    Buy,
    Neutral,
    Avoid,
}

impl Signal {
    pub fn from_score(score: f64) -> Self {
        if score > 0.6 {
            Signal::StrongBuy
        } else if score > 0.2 {
            Signal::Buy
        } else if score < -0.3 {
            Signal::Avoid
        } else {
            Signal::Neutral
        }
    }
}

/// Raw pillar outputs the engine consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionInputs {
    pub trajectory_total: i32,
    pub quality_score: i32,
    pub risk_total: i32,
    pub valuation_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub raw: f64,
    pub weight: f64,
    pub contribution: f64,
}

impl Component {
    fn new(raw: f64, weight: f64) -> Self {
        Self {
            raw,
            weight,
            contribution: raw * weight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundamentalComponents {
    pub growth: Component,
    pub structural: Component,
    pub balance: Component,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundamentalBreakdown {
    pub score: f64,
    pub weight: f64,
    pub components: FundamentalComponents,
    pub risk_multiplier: f64,
    pub risk_adjusted_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationBreakdown {
    /// tanh-compressed valuation lag.
    pub score: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionBreakdown {
    pub fundamentals: FundamentalBreakdown,
    pub valuation: ValuationBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResult {
    pub growth: f64,
    pub structural: f64,
    pub balance: f64,
    pub valuation: f64,
    pub final_score: f64,
    pub signal: Signal,
    pub breakdown: DecisionBreakdown,
}

fn or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn run_decision_engine(inputs: &DecisionInputs) -> DecisionResult {
    let growth = (inputs.trajectory_total as f64 / 4.0).clamp(-1.0, 1.5);
    let structural = (inputs.quality_score as f64 / 5.0).clamp(-1.0, 1.5);
    let balance = inputs.risk_total as f64 / 5.0;
    let valuation = or_zero(inputs.valuation_score).clamp(-2.0, 2.0);

    let components = FundamentalComponents {
        growth: Component::new(growth, GROWTH_WEIGHT),
        structural: Component::new(structural, STRUCTURAL_WEIGHT),
        balance: Component::new(balance, BALANCE_WEIGHT),
    };
    let fundamental_score =
        components.growth.contribution + components.structural.contribution + components.balance.contribution;

    let risk_multiplier = (1.0 + 0.25 * balance).max(MIN_RISK_MULTIPLIER);
    let risk_adjusted_score = fundamental_score * risk_multiplier;

    let valuation_signal = valuation.tanh();
    let final_score =
        (FUNDAMENTAL_LEG * risk_adjusted_score - VALUATION_LEG * valuation_signal).clamp(-1.0, 1.0);

    DecisionResult {
        growth,
        structural,
        balance,
        valuation,
        final_score,
        signal: Signal::from_score(final_score),
        breakdown: DecisionBreakdown {
            fundamentals: FundamentalBreakdown {
                score: fundamental_score,
                weight: FUNDAMENTAL_LEG,
                components,
                risk_multiplier,
                risk_adjusted_score,
            },
            valuation: ValuationBreakdown {
                score: valuation_signal,
                weight: VALUATION_LEG,
                contribution: VALUATION_LEG * valuation_signal,
            },
        },
    }
}
