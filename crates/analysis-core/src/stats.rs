//! Statistics kernel shared by every scoring pillar.
//!
//! All helpers are total: empty input, constant input and non-finite entries
//! resolve to documented neutral values (usually 0) instead of NaN, so nothing
//! downstream has to re-check for poisoned floats.

use serde_json::Value;
use statrs::statistics::Statistics;

/// Standard deviations below this are treated as a flat distribution.
pub const FLAT_EPSILON: f64 = 1e-12;

/// Coerce an externally sourced field to a finite number.
///
/// Numbers pass through, numeric strings are parsed, and everything else
/// (null, `"None"`, empty strings, objects, non-finite results) becomes 0.
pub fn safe_number(value: &Value) -> f64 {
    let raw = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    };
    if raw.is_finite() {
        raw
    } else {
        0.0
    }
}

/// Keep only the finite entries, preserving order.
pub fn finite_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Arithmetic mean of the finite entries; 0 when there are none.
pub fn finite_mean(values: &[f64]) -> f64 {
    let clean = finite_values(values);
    if clean.is_empty() {
        return 0.0;
    }
    clean.iter().mean()
}

/// Population standard deviation. 0 for empty or single-element input.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().population_std_dev()
}

/// Ordinary-least-squares slope against a 0-based index.
///
/// Non-finite entries are dropped first and the remaining points are
/// re-indexed contiguously, so gaps are compacted rather than preserved.
/// Fewer than 3 clean points gives 0.
pub fn slope(values: &[f64]) -> f64 {
    let clean = finite_values(values);
    if clean.len() < 3 {
        return 0.0;
    }

    let n = clean.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    for (i, y) in clean.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denominator
}

/// Rebuild a fitted line through the series mean, one point per input position.
///
/// `meanY + slope * (i - (n - 1) / 2)` over the original (unfiltered) positions,
/// with `meanY` taken over the finite entries only.
pub fn regression_line(values: &[f64], slope: f64) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let mean_x = (n as f64 - 1.0) / 2.0;
    let mean_y = finite_mean(values);
    (0..n).map(|i| mean_y + slope * (i as f64 - mean_x)).collect()
}

/// The trailing `window_size` elements, or the whole series when shorter.
pub fn rolling_window(values: &[f64], window_size: usize) -> &[f64] {
    &values[values.len().saturating_sub(window_size)..]
}

/// Global z-scores over the finite entries.
///
/// Non-finite positions score 0; a flat distribution (deviation below
/// [`FLAT_EPSILON`]) scores all zeros.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let clean = finite_values(values);
    if clean.is_empty() {
        return vec![0.0; values.len()];
    }
    let mean = clean.iter().mean();
    let sd = std_dev(&clean);
    if !sd.is_finite() || sd < FLAT_EPSILON {
        return vec![0.0; values.len()];
    }
    values
        .iter()
        .map(|v| if v.is_finite() { (v - mean) / sd } else { 0.0 })
        .collect()
}

/// Z-score of each position against the trailing `window` entries ending there.
///
/// Only finite entries take part in each window's mean and deviation. Positions
/// with fewer than 2 finite values in their window, a flat window (deviation
/// below [`FLAT_EPSILON`]), or a non-finite value of their own score 0.
pub fn rolling_z_score(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = finite_values(&values[start..=i]);
            if slice.len() < 2 || !values[i].is_finite() {
                return 0.0;
            }
            let mean = slice.iter().mean();
            let sd = std_dev(&slice);
            if sd < FLAT_EPSILON {
                0.0
            } else {
                (values[i] - mean) / sd
            }
        })
        .collect()
}

/// Upper-tail percentile of the finite entries: `sorted[floor(n * q)]`.
///
/// Returns `None` when no finite values exist so callers pick their own fallback.
pub fn upper_percentile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted = finite_values(values);
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let idx = ((sorted.len() as f64 * q).floor() as usize).min(sorted.len() - 1);
    Some(sorted[idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use serde_json::json;

    #[test]
    fn test_safe_number_coercion() {
        assert_eq!(safe_number(&json!("42.5")), 42.5);
        assert_eq!(safe_number(&json!(7)), 7.0);
        assert_eq!(safe_number(&json!("abc")), 0.0);
        assert_eq!(safe_number(&json!("None")), 0.0);
        assert_eq!(safe_number(&Value::Null), 0.0);
        assert_eq!(safe_number(&json!("")), 0.0);
        assert_eq!(safe_number(&json!("inf")), 0.0);
        assert_eq!(safe_number(&json!({"a": 1})), 0.0);
    }

    #[test]
    fn test_std_dev() {
        assert_abs_diff_eq!(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0, epsilon = 1e-9);
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(std_dev(&[5.0]), 0.0);
        assert_abs_diff_eq!(std_dev(&[3.0, 3.0, 3.0]), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(std_dev(&[-1.0, 1.0]), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_slope() {
        assert_abs_diff_eq!(slope(&[1.0, 2.0, 3.0, 4.0, 5.0]), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(slope(&[5.0, 5.0, 5.0, 5.0]), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(slope(&[10.0, 8.0, 6.0, 4.0, 2.0]), -2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(slope(&[0.0, 0.1, 0.2, 0.3]), 0.1, epsilon = 1e-9);
        assert_eq!(slope(&[1.0, 2.0]), 0.0);
        assert_eq!(slope(&[]), 0.0);
    }

    #[test]
    fn test_slope_compacts_gaps() {
        // NaN is dropped and the survivors re-indexed 0..3: [1, 2, 4, 5]
        let with_gap = [1.0, 2.0, f64::NAN, 4.0, 5.0];
        let compacted = slope(&[1.0, 2.0, 4.0, 5.0]);
        assert_abs_diff_eq!(slope(&with_gap), compacted, epsilon = 1e-12);
        assert_abs_diff_eq!(compacted, 1.4, epsilon = 1e-9);

        // Two clean points after filtering is not enough
        assert_eq!(slope(&[1.0, f64::INFINITY, 3.0]), 0.0);
    }

    #[test]
    fn test_regression_line() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let line = regression_line(&values, slope(&values));
        assert_eq!(line.len(), values.len());
        for (fitted, actual) in line.iter().zip(values.iter()) {
            assert_abs_diff_eq!(*fitted, *actual, epsilon = 1e-9);
        }

        let even = [2.0, 4.0, 6.0, 8.0, 10.0];
        let line = regression_line(&even, slope(&even));
        assert_abs_diff_eq!(line[2], 6.0, epsilon = 1e-9);

        let gappy = [1.0, f64::NAN, 3.0];
        let line = regression_line(&gappy, 0.0);
        assert_eq!(line.len(), 3);
        assert!(line.iter().all(|v| (*v - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_rolling_window() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        assert_eq!(rolling_window(&values, 4), &[5.0, 6.0, 7.0, 8.0]);
        assert_eq!(rolling_window(&values[..3], 10), &[1.0, 2.0, 3.0]);
        assert_eq!(rolling_window(&values[..4], 4), &[1.0, 2.0, 3.0, 4.0]);

        for n in 0..12 {
            let window = rolling_window(&values, n);
            assert_eq!(window.len(), n.min(values.len()));
            assert_eq!(window, &values[values.len() - window.len()..]);
        }
    }

    #[test]
    fn test_z_scores() {
        let z = z_scores(&[1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(z[1], 0.0, epsilon = 1e-12);
        assert!(z[0] < 0.0 && z[2] > 0.0);
        assert_abs_diff_eq!(z[0], -z[2], epsilon = 1e-12);

        assert_eq!(z_scores(&[4.0, 4.0, 4.0]), vec![0.0; 3]);
        assert_eq!(z_scores(&[f64::NAN, f64::NAN]), vec![0.0; 2]);

        let with_gap = z_scores(&[1.0, f64::NAN, 3.0]);
        assert_eq!(with_gap[1], 0.0);
        assert_abs_diff_eq!(with_gap[0], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rolling_z_score() {
        let z = rolling_z_score(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(z.len(), 4);
        // First position has a single point in its window
        assert_eq!(z[0], 0.0);
        // [1, 2] -> mean 1.5, population sd 0.5
        assert_abs_diff_eq!(z[1], 1.0, epsilon = 1e-12);
        // [2, 3, 4] -> mean 3, sd sqrt(2/3)
        assert_abs_diff_eq!(z[3], 1.0 / (2.0_f64 / 3.0).sqrt(), epsilon = 1e-12);

        let flat = rolling_z_score(&[5.0, 5.0, 5.0], 3);
        assert_eq!(flat, vec![0.0; 3]);

        // Rounding noise is not a signal
        let noise = rolling_z_score(&[1e-16, -2e-16, 3e-16, 0.0], 4);
        assert_eq!(noise, vec![0.0; 4]);

        let gap = rolling_z_score(&[1.0, f64::NAN, 3.0], 3);
        assert_eq!(gap[1], 0.0);
        assert!(gap.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_upper_percentile() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        assert_eq!(upper_percentile(&values, 0.9), Some(10.0));
        assert_eq!(upper_percentile(&[3.0], 0.9), Some(3.0));
        assert_eq!(upper_percentile(&[f64::NAN], 0.9), None);
        assert_eq!(upper_percentile(&[], 0.9), None);
    }
}
