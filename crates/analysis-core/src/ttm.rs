//! Trailing-twelve-month aggregation and year-over-year change.
//!
//! Both transforms shorten their input: `ttm` drops the first 3 quarters,
//! `yoy_growth` the first 4. Consumers that map results back to quarter dates
//! must apply these offsets (see [`TTM_OFFSET`], [`YOY_LAG`]).

/// Quarters consumed before the first trailing-four-quarter sum exists.
pub const TTM_OFFSET: usize = 3;

/// Quarters between a value and its year-ago comparison.
pub const YOY_LAG: usize = 4;

/// Trailing four-quarter sums, one per quarter from index 3 onward.
pub fn ttm(values: &[f64]) -> Vec<f64> {
    values.windows(TTM_OFFSET + 1).map(|w| w.iter().sum()).collect()
}

/// Lag-4 growth `(v[i] - v[i-4]) / v[i-4]`; a zero base yields 0.
pub fn yoy_growth(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .skip(YOY_LAG)
        .zip(values.iter())
        .map(|(current, prev)| {
            if *prev == 0.0 {
                0.0
            } else {
                (current - prev) / prev
            }
        })
        .collect()
}
