//! # Cervicare
//!
//! Cervical cancer risk scoring for screening programmes.
//!
//! This crate provides:
//! - Risk scoring from a signed logistic model, falling back to clinical rules
//! - Risk classification, recommendations and plain-language explanations
//! - Local screening records and follow-up tracking
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core screening types and the pure risk pipeline
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (logistic model, SQLite, log redaction)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{RiskPredictor, ScreeningService};
pub use config::{AppConfig, PredictorConfig};
pub use domain::{ClinicalInput, RiskAssessment, RiskLevel};

/// Result type for Cervicare operations
pub type Result<T> = std::result::Result<T, CervicareError>;

/// Main error type for Cervicare
#[derive(Debug, thiserror::Error)]
pub enum CervicareError {
    #[error("Risk model error: {0}")]
    Model(#[from] ports::ModelError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Invalid screening input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
