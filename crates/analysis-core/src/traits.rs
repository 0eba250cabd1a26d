use crate::stats::{finite_values, regression_line, slope};
use crate::types::{PillarResult, PillarState};

/// A trajectory pillar: classifies a windowed derived series by its trend.
pub trait SeriesScorer {
    /// Finite points required before the window can be classified.
    fn min_points(&self) -> usize {
        3
    }

    /// Map a fitted slope to a score and named state.
    fn classify(&self, slope: f64) -> (i32, PillarState);

    /// Score `window`, falling back to `insufficient-data` on short input.
    fn score(&self, window: &[f64]) -> PillarResult {
        if finite_values(window).len() < self.min_points() {
            return insufficient(window);
        }
        self.fitted(window)
    }

    /// Slope-based classification of a window that passed the point-count check.
    fn fitted(&self, window: &[f64]) -> PillarResult {
        let fitted = slope(window);
        let (score, state) = self.classify(fitted);
        PillarResult {
            score,
            state,
            slope: fitted,
            window_values: window.to_vec(),
            regression_line: regression_line(window, fitted),
        }
    }
}

/// Zero-score result that still carries the window and a flat line through its mean.
pub fn insufficient(window: &[f64]) -> PillarResult {
    PillarResult {
        score: 0,
        state: PillarState::InsufficientData,
        slope: 0.0,
        window_values: window.to_vec(),
        regression_line: regression_line(window, 0.0),
    }
}
