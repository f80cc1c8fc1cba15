//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod predictor;
mod screening;

pub use predictor::{RiskPredictor, ScoringStrategy};
pub use screening::{ScreeningOutcome, ScreeningService};
