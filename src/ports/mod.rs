//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the predictor and external systems (model artifacts, storage).

mod risk_model;
mod storage;

pub use risk_model::{ModelError, RiskModel};
pub use storage::{ScreeningPage, ScreeningStore};
