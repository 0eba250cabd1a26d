//! Valuation lag: how far the traded multiple has decoupled from what the
//! fundamental composite justifies.
//!
//! Monthly enterprise value is divided by a forward-filled trailing basis
//! (EBITDA when profitable, revenue otherwise), log-transformed, regressed on
//! the forward-filled composite over a rolling window, and the residual is
//! standardized with a rolling z-score. A negative score means the price sits
//! below what fundamentals justify.

pub mod engine;
pub mod monthly;
pub mod multiple;
pub mod regression;

pub use engine::{fundamental_composite, MonthlyValuation, ValuationLag, ValuationLagEngine, ValuationState};
pub use multiple::ValuationPhase;
