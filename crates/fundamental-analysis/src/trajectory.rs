use analysis_core::stats::{finite_values, regression_line, rolling_window, slope};
use analysis_core::{insufficient, PillarResult, PillarState, SeriesScorer};
use serde::{Deserialize, Serialize};

/// YoY revenue growth momentum.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrowthMomentum;

impl SeriesScorer for GrowthMomentum {
    fn classify(&self, slope: f64) -> (i32, PillarState) {
        if slope > 0.01 {
            (2, PillarState::ExplosiveAcceleration)
        } else if slope > 0.005 {
            (1, PillarState::Accelerating)
        } else if slope < -0.01 {
            (-2, PillarState::StructuralDeceleration)
        } else if slope < -0.005 {
            (-1, PillarState::Decelerating)
        } else {
            (0, PillarState::Neutral)
        }
    }
}

/// TTM operating margin direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarginDynamics;

impl SeriesScorer for MarginDynamics {
    fn classify(&self, slope: f64) -> (i32, PillarState) {
        const EPSILON: f64 = 0.005;
        if slope > EPSILON {
            (1, PillarState::Expanding)
        } else if slope < -EPSILON {
            (-1, PillarState::Compressing)
        } else {
            (0, PillarState::Stable)
        }
    }
}

/// ROIC direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapitalEfficiency;

impl SeriesScorer for CapitalEfficiency {
    fn classify(&self, slope: f64) -> (i32, PillarState) {
        const EPSILON: f64 = 0.01;
        if slope > EPSILON {
            (1, PillarState::Improving)
        } else if slope < -EPSILON {
            (-1, PillarState::Deteriorating)
        } else {
            (0, PillarState::Stable)
        }
    }
}

/// FCF margin direction, with a bonus for a durable negative-to-positive flip.
#[derive(Debug, Clone, Copy, Default)]
pub struct FcfTrajectory;

impl FcfTrajectory {
    /// At least one negative value, the last two positive, and nothing negative
    /// once the first positive value has been seen.
    pub fn is_persistent_inflection(window: &[f64]) -> bool {
        let had_negative = window.iter().any(|v| *v < 0.0);
        let last_two_positive = window.len() >= 2 && window[window.len() - 2..].iter().all(|v| *v > 0.0);
        let no_reversion = match window.iter().position(|v| *v > 0.0) {
            Some(first_positive) => !window[first_positive..].iter().any(|v| *v < 0.0),
            None => true,
        };
        had_negative && last_two_positive && no_reversion
    }
}

impl SeriesScorer for FcfTrajectory {
    fn min_points(&self) -> usize {
        2
    }

    fn classify(&self, slope: f64) -> (i32, PillarState) {
        const EPSILON: f64 = 0.005;
        if slope > EPSILON {
            (1, PillarState::Improving)
        } else if slope < -EPSILON {
            (-1, PillarState::Deteriorating)
        } else {
            (0, PillarState::Stable)
        }
    }

    fn score(&self, window: &[f64]) -> PillarResult {
        if finite_values(window).len() < self.min_points() {
            return insufficient(window);
        }
        if Self::is_persistent_inflection(window) {
            return PillarResult {
                score: 2,
                state: PillarState::PersistentInflection,
                slope: 0.0,
                window_values: window.to_vec(),
                regression_line: regression_line(window, slope(window)),
            };
        }
        self.fitted(window)
    }
}

/// Overall trajectory verdict from the four pillar scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrajectoryClass {
    StructuralCompounder,
    PositiveTrajectory,
    Neutral,
    NegativeTrajectory,
    StructuralDeterioration,
}

impl TrajectoryClass {
    pub fn from_total(total: i32) -> Self {
        match total {
            t if t >= 3 => TrajectoryClass::StructuralCompounder,
            t if t >= 1 => TrajectoryClass::PositiveTrajectory,
            0 => TrajectoryClass::Neutral,
            t if t <= -3 => TrajectoryClass::StructuralDeterioration,
            _ => TrajectoryClass::NegativeTrajectory,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryStrength {
    pub total: i32,
    pub state: TrajectoryClass,
}

pub fn trajectory_strength(growth: i32, margin: i32, fcf: i32, capital: i32) -> TrajectoryStrength {
    let total = growth + margin + fcf + capital;
    TrajectoryStrength {
        total,
        state: TrajectoryClass::from_total(total),
    }
}

/// The four pillar results plus their combined strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryScores {
    pub growth: PillarResult,
    pub margin: PillarResult,
    pub fcf: PillarResult,
    pub capital_efficiency: PillarResult,
    pub strength: TrajectoryStrength,
}

impl TrajectoryScores {
    /// Score the trailing `window_size` entries of each full-length series.
    pub fn compute(
        yoy_growth: &[f64],
        margins: &[f64],
        fcf_margins: &[f64],
        roic: &[f64],
        window_size: usize,
    ) -> Self {
        let growth = GrowthMomentum.score(rolling_window(yoy_growth, window_size));
        let margin = MarginDynamics.score(rolling_window(margins, window_size));
        let fcf = FcfTrajectory.score(rolling_window(fcf_margins, window_size));
        let capital_efficiency = CapitalEfficiency.score(rolling_window(roic, window_size));

        let strength = trajectory_strength(growth.score, margin.score, fcf.score, capital_efficiency.score);
        tracing::debug!(
            growth = growth.score,
            margin = margin.score,
            fcf = fcf.score,
            capital = capital_efficiency.score,
            total = strength.total,
            "Trajectory pillars scored"
        );

        Self {
            growth,
            margin,
            fcf,
            capital_efficiency,
            strength,
        }
    }
}
