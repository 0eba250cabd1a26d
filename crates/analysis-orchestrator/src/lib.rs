use analysis_core::{AnalysisError, CompanyFinancials, DatedSeries, PillarResult};
use chrono::NaiveDate;
use fundamental_analysis::{BalanceSheetRisk, FundamentalSeries, StructuralQuality, TrajectoryScores, TrajectoryStrength};
use serde::{Deserialize, Serialize};
use valuation_lag::{ValuationLag, ValuationLagEngine};

pub mod config;
pub mod decision;
pub mod history;

pub use config::AnalysisConfig;
pub use decision::{run_decision_engine, DecisionInputs, DecisionResult, Signal};
pub use history::NormalizedHistory;


/// Everything the pipeline derives for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyAnalysis {
    pub symbol: Option<String>,
    /// Configured anchor, else the latest date present in the input.
    pub anchor_date: Option<NaiveDate>,
    pub window_size: usize,
    pub growth_score: PillarResult,
    pub margin_result: PillarResult,
    pub fcf_result: PillarResult,
    pub capital_result: PillarResult,
    pub trajectory_strength: TrajectoryStrength,
    pub structural_quality: StructuralQuality,
    pub balance_sheet_risk: BalanceSheetRisk,
    pub valuation_lag: ValuationLag,
    pub decision: DecisionResult,
    pub is_profitable: bool,
    pub revenue_ttm: DatedSeries,
    pub yoy_growth: DatedSeries,
    pub margins: DatedSeries,
    pub fcf_margins: DatedSeries,
    pub roic: DatedSeries,
}

/// Runs every pillar over one entity's statements. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct ScoringPipeline {
    config: AnalysisConfig,
    valuation: ValuationLagEngine,
}

impl ScoringPipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let valuation = ValuationLagEngine::new(config.valuation_window());
        Ok(Self { config, valuation })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze(&self, financials: &CompanyFinancials) -> CompanyAnalysis {
        let window = self.config.window_size;
        let history = NormalizedHistory::new(financials, self.config.anchor_date);
        let quarters = history.quarters();

        tracing::debug!(
            symbol = financials.symbol.as_deref().unwrap_or("-"),
            quarters = quarters.len(),
            balance_sheets = history.balance.len(),
            months = history.prices.len(),
            "Normalized statement history"
        );
        if quarters.len() < 8 {
            tracing::warn!(
                quarters = quarters.len(),
                "Fewer than 8 quarters; growth-based pillars will report insufficient data"
            );
        }

        let series = FundamentalSeries::from_quarters(&quarters);
        let is_profitable = series.latest_ebitda_ttm() > 0.0;

        let trajectory = TrajectoryScores::compute(
            &series.yoy_growth.values,
            &series.margins.values,
            &series.fcf_margins.values,
            &series.roic.values,
            window,
        );
        let structural_quality = StructuralQuality::compute(
            &series.roic.values,
            &series.fcf_margins.values,
            &series.yoy_growth.values,
            &series.margins.values,
            window,
        );
        let balance_sheet_risk = BalanceSheetRisk::compute(&history.balance, &history.income, window);
        let valuation_lag = self.valuation.compute(&history.prices, &history.balance, &series);

        let decision = run_decision_engine(&DecisionInputs {
            trajectory_total: trajectory.strength.total,
            quality_score: structural_quality.score,
            risk_total: balance_sheet_risk.total_score,
            valuation_score: valuation_lag.score,
        });

        if let Some((date, revenue)) = series.revenue_ttm.latest() {
            tracing::debug!(%date, revenue_ttm = revenue, "Latest trailing revenue");
        }
        tracing::info!(
            symbol = financials.symbol.as_deref().unwrap_or("-"),
            growth = trajectory.growth.state.label(),
            fcf = trajectory.fcf.state.label(),
            final_score = decision.final_score,
            signal = ?decision.signal,
            "Scoring complete"
        );

        CompanyAnalysis {
            symbol: financials.symbol.clone(),
            anchor_date: self.config.anchor_date.or_else(|| history.latest_date()),
            window_size: window,
            growth_score: trajectory.growth,
            margin_result: trajectory.margin,
            fcf_result: trajectory.fcf,
            capital_result: trajectory.capital_efficiency,
            trajectory_strength: trajectory.strength,
            structural_quality,
            balance_sheet_risk,
            is_profitable,
            valuation_lag,
            decision,
            revenue_ttm: series.revenue_ttm,
            yoy_growth: series.yoy_growth,
            margins: series.margins,
            fcf_margins: series.fcf_margins,
            roic: series.roic,
        }
    }
}
