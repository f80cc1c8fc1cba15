//! Risk predictor: Orchestrates the scoring pipeline.
//!
//! This service coordinates:
//! - Feature encoding
//! - Model-backed or rule-based scoring
//! - Classification, recommendation and explanation
//!
//! The scoring strategy is chosen once at construction. A model that fails to
//! load is never retried; the predictor runs on rules for its lifetime.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::adapters::logistic::LogisticModel;
use crate::config::PredictorConfig;
use crate::domain::{
    classify, explain, recommend, round_score, rule_based_score, ClinicalInput, FeatureVector,
    RiskAssessment, ScoringSource,
};
use crate::ports::{ModelError, RiskModel};

/// How scores are produced for the lifetime of a predictor.
#[derive(Clone)]
pub enum ScoringStrategy {
    /// Loaded classifier; rules cover individual failed calls
    ModelBacked(Arc<dyn RiskModel>),
    /// Deterministic rule cascade only
    RuleBased,
}

impl std::fmt::Debug for ScoringStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelBacked(model) => write!(f, "ModelBacked({})", model.describe()),
            Self::RuleBased => f.write_str("RuleBased"),
        }
    }
}

/// Cervical cancer risk predictor.
///
/// `Send + Sync`; share it behind an `Arc` across threads without locking.
#[derive(Debug, Clone)]
pub struct RiskPredictor {
    strategy: ScoringStrategy,
    model_confidence: f64,
    rules_confidence: f64,
}

impl RiskPredictor {
    /// Build a predictor, loading the configured model artifact if any.
    ///
    /// A missing, corrupt or unverifiable artifact is logged and the
    /// predictor falls back to rule-based scoring.
    #[must_use]
    pub fn new(config: &PredictorConfig) -> Self {
        let strategy = match &config.model_path {
            None => {
                tracing::info!("No risk model configured, using rule-based scoring");
                ScoringStrategy::RuleBased
            }
            Some(path) => match config
                .integrity_policy()
                .and_then(|policy| LogisticModel::load(path, &policy))
            {
                Ok(model) => ScoringStrategy::ModelBacked(Arc::new(model)),
                Err(e) => {
                    tracing::warn!(
                        "Risk model unavailable ({e}), using rule-based scoring for this process"
                    );
                    ScoringStrategy::RuleBased
                }
            },
        };

        Self::with_strategy(strategy, config)
    }

    /// Build a predictor around an already-loaded model.
    #[must_use]
    pub fn with_model(model: Arc<dyn RiskModel>, config: &PredictorConfig) -> Self {
        Self::with_strategy(ScoringStrategy::ModelBacked(model), config)
    }

    /// Build a rule-based predictor.
    #[must_use]
    pub fn rules_only(config: &PredictorConfig) -> Self {
        Self::with_strategy(ScoringStrategy::RuleBased, config)
    }

    fn with_strategy(strategy: ScoringStrategy, config: &PredictorConfig) -> Self {
        Self {
            strategy,
            model_confidence: config.model_confidence,
            rules_confidence: config.rules_confidence,
        }
    }

    #[must_use]
    pub fn strategy(&self) -> &ScoringStrategy {
        &self.strategy
    }

    #[must_use]
    pub fn is_model_backed(&self) -> bool {
        matches!(self.strategy, ScoringStrategy::ModelBacked(_))
    }

    /// Confidence reported for scores from `source`.
    #[must_use]
    pub fn confidence(&self, source: ScoringSource) -> f64 {
        match source {
            ScoringSource::Model => self.model_confidence,
            ScoringSource::Rules => self.rules_confidence,
            ScoringSource::Degraded => crate::domain::DEGRADED_CONFIDENCE,
        }
    }

    /// Score an input and report which path produced it.
    ///
    /// A model inference error or a panic inside the model adapter is logged
    /// and that call alone falls back to rules. Model probabilities are
    /// clamped to [0, 1]; a non-finite probability is passed through for
    /// `predict` to reject.
    #[must_use]
    pub fn score(&self, input: &ClinicalInput) -> (f64, ScoringSource) {
        if let ScoringStrategy::ModelBacked(model) = &self.strategy {
            let features = FeatureVector::encode(input);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| model.predict_proba(&features)))
                .unwrap_or_else(|_| {
                    Err(ModelError::Inference(format!(
                        "{} panicked during inference",
                        model.describe()
                    )))
                });
            match outcome {
                Ok(p) if p.is_finite() => return (p.clamp(0.0, 1.0), ScoringSource::Model),
                Ok(p) => return (p, ScoringSource::Model),
                Err(e) => {
                    tracing::warn!(
                        "Model inference failed ({e}), using rule-based score for this call"
                    );
                }
            }
        }

        (rule_based_score(input), ScoringSource::Rules)
    }

    /// Produce a full risk assessment.
    ///
    /// Never fails: a non-finite score or any other failure outside model
    /// inference yields [`RiskAssessment::degraded`].
    #[must_use]
    pub fn predict(&self, input: &ClinicalInput) -> RiskAssessment {
        match panic::catch_unwind(AssertUnwindSafe(|| self.try_predict(input))) {
            Ok(Ok(assessment)) => assessment,
            Ok(Err(e)) => {
                tracing::error!("Risk assessment failed: {e}");
                RiskAssessment::degraded()
            }
            Err(_) => {
                tracing::error!("Risk assessment panicked, returning degraded result");
                RiskAssessment::degraded()
            }
        }
    }

    /// Produce a risk assessment, surfacing internal errors.
    ///
    /// The level is classified from the score after rounding to three
    /// decimals, so a raw probability in [0.6995, 0.7) is reported as 0.7 and
    /// HIGH. Classifying the unrounded value would give MODERATE next to a
    /// displayed 0.7.
    ///
    /// # Errors
    /// Returns `ModelError::Inference` if the score is not a finite number.
    pub fn try_predict(&self, input: &ClinicalInput) -> Result<RiskAssessment, ModelError> {
        let (raw, source) = self.score(input);
        if !raw.is_finite() {
            return Err(ModelError::Inference(format!(
                "non-finite risk score from {source:?} scoring"
            )));
        }

        let risk_score = round_score(raw.clamp(0.0, 1.0));
        let risk_level = classify(risk_score);
        let recommendation = recommend(risk_level, input);
        let explanation = explain(input, risk_score);

        tracing::debug!(
            "Risk assessment: score={risk_score:.3} level={risk_level} source={} follow_up={}",
            source.code(),
            recommendation.follow_up_months
        );

        Ok(RiskAssessment {
            risk_score,
            risk_level,
            confidence: self.confidence(source),
            recommended_action: recommendation.action,
            follow_up_months: recommendation.follow_up_months,
            referral_needed: recommendation.referral_needed,
            explanation,
            scoring_source: source,
        })
    }
}
