use analysis_core::stats::upper_percentile;
use serde::{Deserialize, Serialize};

/// Penalty base when no month has a valid multiple.
pub const DEFAULT_P90_MULTIPLE: f64 = 50.0;

pub const PENALTY_FACTOR: f64 = 1.5;

/// Which trailing fundamental the price multiple is taken against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValuationPhase {
    /// Trailing EBITDA is positive: EV / EBITDA.
    Profitable,
    /// EV / Revenue.
    Unprofitable,
}

impl ValuationPhase {
    pub fn from_latest_ebitda(ebitda_ttm: f64) -> Self {
        if ebitda_ttm > 0.0 {
            ValuationPhase::Profitable
        } else {
            ValuationPhase::Unprofitable
        }
    }

    pub fn multiple_label(&self) -> &'static str {
        match self {
            ValuationPhase::Profitable => "EV / EBITDA",
            ValuationPhase::Unprofitable => "EV / Revenue",
        }
    }
}

/// Monthly multiples with their outlier guard applied.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardedMultiples {
    pub values: Vec<f64>,
    pub penalty: f64,
}

fn valid_multiple(ev: f64, basis: f64) -> Option<f64> {
    (ev.is_finite() && basis.is_finite() && basis > 0.0).then(|| ev / basis)
}

/// EV over basis, position by position over the shorter of the two series.
///
/// Months with a non-positive or non-finite basis are replaced: under the
/// profitable phase by `1.5 * p90` of the valid multiples, under the
/// unprofitable phase by the last valid multiple (the penalty only before the
/// first valid month).
pub fn guarded_multiples(ev: &[f64], basis: &[f64], phase: ValuationPhase) -> GuardedMultiples {
    let raw: Vec<Option<f64>> = ev
        .iter()
        .zip(basis)
        .map(|(ev, basis)| valid_multiple(*ev, *basis))
        .collect();

    let valid: Vec<f64> = raw.iter().flatten().copied().collect();
    let p90 = upper_percentile(&valid, 0.9).unwrap_or(DEFAULT_P90_MULTIPLE);
    let penalty = p90 * PENALTY_FACTOR;

    let values = match phase {
        ValuationPhase::Profitable => raw.iter().map(|m| m.unwrap_or(penalty)).collect(),
        ValuationPhase::Unprofitable => {
            let mut previous = None;
            raw.iter()
                .map(|m| match m {
                    Some(multiple) => {
                        previous = Some(*multiple);
                        *multiple
                    }
                    None => previous.unwrap_or(penalty),
                })
                .collect()
        }
    };

    GuardedMultiples { values, penalty }
}

/// Natural log of each multiple; non-positive or non-finite entries become NaN.
pub fn log_multiples(multiples: &[f64]) -> Vec<f64> {
    multiples
        .iter()
        .map(|m| if m.is_finite() && *m > 0.0 { m.ln() } else { f64::NAN })
        .collect()
}
