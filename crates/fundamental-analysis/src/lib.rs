//! Fundamental pillars computed from ascending quarterly statements.

pub mod balance_sheet;
pub mod derived;
pub mod quality;
pub mod trajectory;

pub use balance_sheet::{BalanceSheetRisk, RiskState};
pub use derived::FundamentalSeries;
pub use quality::{QualityState, StructuralQuality};
pub use trajectory::{
    trajectory_strength, CapitalEfficiency, FcfTrajectory, GrowthMomentum, MarginDynamics, TrajectoryClass,
    TrajectoryScores, TrajectoryStrength,
};
