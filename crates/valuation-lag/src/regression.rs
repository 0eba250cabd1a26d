//! Rolling regression of log-multiple on the fundamental composite.

use statrs::statistics::Statistics;

/// Z-score a trough must fall below to count as a bottom signal.
pub const BOTTOM_THRESHOLD: f64 = -1.5;

/// Summed squared deviation of the composite treated as no variation at all.
pub const MIN_VARIANCE: f64 = 1e-12;

/// Least-squares fit `y = alpha + beta * x` over paired observations.
///
/// A flat `x` (variance below [`MIN_VARIANCE`]) gives `beta = 0` and `alpha = mean(y)`.
pub fn fit_line(x: &[f64], y: &[f64]) -> (f64, f64) {
    let mean_x = x.iter().mean();
    let mean_y = y.iter().mean();

    let mut covariance = 0.0;
    let mut variance_x = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        covariance += dx * (yi - mean_y);
        variance_x += dx * dx;
    }

    let beta = if variance_x > MIN_VARIANCE { covariance / variance_x } else { 0.0 };
    (mean_y - beta * mean_x, beta)
}

/// Residual of each month's log-multiple against the fit over its trailing `window`.
///
/// Pairs with a non-finite value on either side are left out of the fit. With
/// fewer than 2 usable pairs the residual is 0; a non-finite log-multiple at the
/// month itself yields NaN.
pub fn rolling_residuals(fundamentals: &[f64], log_multiples: &[f64], window: usize) -> Vec<f64> {
    let n = fundamentals.len().min(log_multiples.len());
    let window = window.max(1);

    (0..n)
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let (x, y): (Vec<f64>, Vec<f64>) = fundamentals[start..=i]
                .iter()
                .zip(&log_multiples[start..=i])
                .filter(|(f, m)| f.is_finite() && m.is_finite())
                .map(|(f, m)| (*f, *m))
                .unzip();

            if x.len() < 2 {
                return 0.0;
            }
            let actual = log_multiples[i];
            if !actual.is_finite() {
                return f64::NAN;
            }
            let (alpha, beta) = fit_line(&x, &y);
            actual - (alpha + beta * fundamentals[i])
        })
        .collect()
}

/// Flag local minima of `scores` that sit below `threshold`.
///
/// A position is flagged when its neighbours on both sides are strictly higher;
/// the first and last positions are never flagged.
pub fn detect_bottoms(scores: &[f64], threshold: f64) -> Vec<bool> {
    let mut flags = vec![false; scores.len()];
    for i in 1..scores.len().saturating_sub(1) {
        let (prev, current, next) = (scores[i - 1], scores[i], scores[i + 1]);
        if prev > current && current < next && current < threshold {
            flags[i] = true;
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fit_line() {
        let (alpha, beta) = fit_line(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]);
        assert_abs_diff_eq!(alpha, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(beta, 2.0, epsilon = 1e-12);

        let (alpha, beta) = fit_line(&[1.0, 1.0, 1.0], &[2.0, 4.0, 6.0]);
        assert_eq!(beta, 0.0);
        assert_abs_diff_eq!(alpha, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_perfect_tracking_leaves_no_residual() {
        let fundamentals: Vec<f64> = (0..24).map(|i| 0.1 + 0.01 * i as f64).collect();
        let logs: Vec<f64> = fundamentals.iter().map(|f| 2.0 + 3.0 * f).collect();
        let residuals = rolling_residuals(&fundamentals, &logs, 12);

        assert_eq!(residuals[0], 0.0);
        for r in &residuals {
            assert_abs_diff_eq!(*r, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_residual_sign_marks_cheap_months() {
        let fundamentals = [0.1, 0.2, 0.3, 0.4, 0.5];
        let logs = [1.0, 1.1, 1.2, 1.3, 0.9];
        let residuals = rolling_residuals(&fundamentals, &logs, 5);
        assert!(residuals[4] < 0.0);
    }

    #[test]
    fn test_non_finite_pairs_are_skipped() {
        let fundamentals = [0.1, 0.2, 0.3, 0.4];
        let logs = [1.0, f64::NAN, 1.2, f64::NAN];
        let residuals = rolling_residuals(&fundamentals, &logs, 4);

        assert_eq!(residuals[0], 0.0);
        // Only one clean pair in the first two months
        assert_eq!(residuals[1], 0.0);
        assert_abs_diff_eq!(residuals[2], 0.0, epsilon = 1e-12);
        assert!(residuals[3].is_nan());
    }

    #[test]
    fn test_detect_bottoms() {
        let z = [0.0, -1.0, -2.0, -1.0, -1.6, -1.4, 0.5];
        let flags = detect_bottoms(&z, BOTTOM_THRESHOLD);
        assert_eq!(flags, vec![false, false, true, false, true, false, false]);

        // Shallow trough is not extreme enough
        assert_eq!(detect_bottoms(&[0.0, -1.0, 0.0], BOTTOM_THRESHOLD), vec![false; 3]);
        assert!(detect_bottoms(&[], BOTTOM_THRESHOLD).is_empty());
        assert_eq!(detect_bottoms(&[-3.0], BOTTOM_THRESHOLD), vec![false]);
    }
}
