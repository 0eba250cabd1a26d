use analysis_core::AnalysisError;
use anyhow::{Context, Result};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_WINDOW_SIZE: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Trailing quarters used for every quarterly pillar.
    pub window_size: usize,
    /// Months in the valuation regression and z-score window (default `window_size * 3`).
    pub valuation_window_months: Option<usize>,
    /// Point-in-time cutoff applied to every input series.
    pub anchor_date: Option<NaiveDate>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            valuation_window_months: None,
            anchor_date: None,
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            window_size: env::var("SCORE_WINDOW_SIZE")
                .unwrap_or_else(|_| DEFAULT_WINDOW_SIZE.to_string())
                .parse()
                .context("SCORE_WINDOW_SIZE must be a positive integer")?,
            valuation_window_months: env::var("VALUATION_WINDOW_MONTHS")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .context("VALUATION_WINDOW_MONTHS must be a positive integer")?,
            anchor_date: env::var("ANCHOR_DATE").ok().map(|v| parse_anchor(&v)).transpose()?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.window_size == 0 {
            return Err(AnalysisError::InvalidConfig("window size must be at least 1".to_string()));
        }
        if let Some(months) = self.valuation_window_months {
            if months < 2 {
                return Err(AnalysisError::InvalidConfig(
                    "valuation window must span at least 2 months".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn valuation_window(&self) -> usize {
        self.valuation_window_months.unwrap_or(self.window_size.saturating_mul(3))
    }
}

/// Parse `YYYY-MM-DD`, or `YYYY-MM` as the last day of that month.
pub fn parse_anchor(raw: &str) -> Result<NaiveDate, AnalysisError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
        .ok()
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| AnalysisError::InvalidConfig(format!("anchor date {raw:?} is not YYYY-MM-DD or YYYY-MM")))
}
