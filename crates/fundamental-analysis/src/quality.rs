//! Structural quality: return levels and stability of growth and margins.

use analysis_core::stats::{finite_mean, rolling_window, slope, std_dev};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityState {
    Elite,
    Strong,
    Average,
    Weak,
}

impl QualityState {
    pub fn from_score(score: i32) -> Self {
        if score >= 5 {
            QualityState::Elite
        } else if score >= 3 {
            QualityState::Strong
        } else if score <= 0 {
            QualityState::Weak
        } else {
            QualityState::Average
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralQuality {
    #[serde(rename = "avgROIC")]
    pub avg_roic: f64,
    #[serde(rename = "avgFCFMargin")]
    pub avg_fcf_margin: f64,
    pub growth_volatility: f64,
    /// Dispersion of the margin window after removing its fitted trend.
    pub margin_volatility: f64,
    pub score: i32,
    pub state: QualityState,
    pub is_improving_margins: bool,
    pub is_accelerating_growth: bool,
}

impl StructuralQuality {
    /// Score the trailing `window_size` entries of each full-length series.
    pub fn compute(
        roic: &[f64],
        fcf_margins: &[f64],
        yoy_growth: &[f64],
        margins: &[f64],
        window_size: usize,
    ) -> Self {
        let roic_window = rolling_window(roic, window_size);
        let fcf_window = rolling_window(fcf_margins, window_size);
        let growth_window = rolling_window(yoy_growth, window_size);
        let margin_window = rolling_window(margins, window_size);

        let avg_roic = finite_mean(roic_window);
        let avg_fcf_margin = finite_mean(fcf_window);

        let growth_volatility = std_dev(growth_window);
        let margin_slope = slope(margin_window);
        let detrended: Vec<f64> = margin_window
            .iter()
            .enumerate()
            .map(|(i, v)| v - margin_slope * i as f64)
            .collect();
        let margin_volatility = std_dev(&detrended);

        let is_improving_margins = latest_above_mean(margins, margin_window);
        let is_accelerating_growth = latest_above_mean(yoy_growth, growth_window);

        let mut score = roic_tier(avg_roic) + fcf_margin_tier(avg_fcf_margin);

        if growth_volatility < 0.05 {
            score += 1;
        } else if growth_volatility > 0.2 && !is_accelerating_growth {
            score -= 1;
        }

        if margin_volatility < 0.03 {
            score += 1;
        } else if margin_volatility > 0.1 && !is_improving_margins {
            score -= 1;
        }

        Self {
            avg_roic,
            avg_fcf_margin,
            growth_volatility,
            margin_volatility,
            score,
            state: QualityState::from_score(score),
            is_improving_margins,
            is_accelerating_growth,
        }
    }
}

fn roic_tier(avg_roic: f64) -> i32 {
    if avg_roic > 0.4 {
        3
    } else if avg_roic > 0.2 {
        2
    } else if avg_roic > 0.1 {
        1
    } else {
        0
    }
}

fn fcf_margin_tier(avg_fcf_margin: f64) -> i32 {
    if avg_fcf_margin > 0.4 {
        3
    } else if avg_fcf_margin > 0.25 {
        2
    } else if avg_fcf_margin > 0.15 {
        1
    } else {
        0
    }
}

fn latest_above_mean(series: &[f64], window: &[f64]) -> bool {
    series.last().is_some_and(|latest| *latest > finite_mean(window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_elite_quality() {
        let high = vec![0.45; 12];
        let growth = vec![0.1; 12];
        let margins = vec![0.3; 12];
        let quality = StructuralQuality::compute(&high, &high, &growth, &margins, 12);

        assert_abs_diff_eq!(quality.avg_roic, 0.45, epsilon = 1e-12);
        assert_eq!(quality.score, 8);
        assert!(quality.score >= 5);
        assert_eq!(quality.state, QualityState::Elite);
    }

    #[test]
    fn test_weak_quality_with_volatility() {
        let roic = vec![0.05; 12];
        let fcf = vec![0.02; 12];
        // Alternating growth, ending on the low side so it is not accelerating
        let growth: Vec<f64> = (0..12).map(|i| if i % 2 == 0 { 0.6 } else { -0.4 }).collect();
        let margins: Vec<f64> = (0..12).map(|i| if i % 2 == 0 { 0.4 } else { 0.05 }).collect();
        let quality = StructuralQuality::compute(&roic, &fcf, &growth, &margins, 12);

        assert!(quality.growth_volatility > 0.2);
        assert!(quality.margin_volatility > 0.1);
        assert!(!quality.is_accelerating_growth);
        assert!(!quality.is_improving_margins);
        assert!(quality.score <= 0);
        assert_eq!(quality.state, QualityState::Weak);
    }

    #[test]
    fn test_volatility_penalty_waived_when_trending_up() {
        let roic = vec![0.05; 6];
        let fcf = vec![0.02; 6];
        let growth = vec![-0.4, 0.6, -0.4, 0.6, -0.4, 0.6];
        let margins = vec![0.05, 0.4, 0.05, 0.4, 0.05, 0.4];
        let quality = StructuralQuality::compute(&roic, &fcf, &growth, &margins, 6);

        assert!(quality.is_accelerating_growth);
        assert!(quality.is_improving_margins);
        assert_eq!(quality.score, 0);
    }

    #[test]
    fn test_trend_is_removed_from_margin_volatility() {
        let margins: Vec<f64> = (0..12).map(|i| 0.1 + 0.03 * i as f64).collect();
        let quality = StructuralQuality::compute(&[0.15; 12], &[0.2; 12], &[0.1; 12], &margins, 12);
        assert_abs_diff_eq!(quality.margin_volatility, 0.0, epsilon = 1e-9);
        // ROIC +1, FCF +1, growth stability +1, margin stability +1
        assert_eq!(quality.score, 4);
        assert_eq!(quality.state, QualityState::Strong);
    }

    #[test]
    fn test_invalid_roic_quarters_are_ignored() {
        let roic = [f64::NAN, 0.3, f64::NAN, 0.3];
        let quality = StructuralQuality::compute(&roic, &[0.0; 4], &[0.0; 4], &[0.1; 4], 4);
        assert_abs_diff_eq!(quality.avg_roic, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_series() {
        let quality = StructuralQuality::compute(&[], &[], &[], &[], 12);
        assert_eq!(quality.avg_roic, 0.0);
        assert_eq!(quality.growth_volatility, 0.0);
        // Both stability bonuses apply to empty windows
        assert_eq!(quality.score, 2);
        assert_eq!(quality.state, QualityState::Average);
    }
}
