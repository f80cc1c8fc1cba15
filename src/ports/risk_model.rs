//! Risk model port: Trait for probabilistic classifiers.
//!
//! This trait abstracts the model artifact format from the predictor.

use crate::domain::FeatureVector;

/// Errors raised while loading or evaluating a risk model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model artifact not found: {0}")]
    NotFound(String),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Model integrity check failed: {0}")]
    Integrity(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A loaded classifier producing the probability of the positive class.
///
/// Implementations are immutable after loading and shared across threads.
pub trait RiskModel: Send + Sync {
    /// Probability that the encoded patient belongs to the high-risk class.
    ///
    /// # Errors
    /// Returns `ModelError::Inference` if the model cannot evaluate the vector.
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    /// Short identifier for logs (name and version).
    fn describe(&self) -> String;
}
