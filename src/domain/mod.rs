//! Domain layer: Core screening types and the pure risk pipeline.
//!
//! Everything here is a deterministic function of a `ClinicalInput`.
//! Model loading, storage and logging setup live in the outer layers.

mod assessment;
mod explanation;
mod features;
mod follow_up;
mod recommendation;
mod rules;
mod screening;

pub use assessment::{
    round_score, Recommendation, RiskAssessment, RiskLevel, ScoringSource, DEGRADED_CONFIDENCE,
    HIGH_RISK_THRESHOLD, MODERATE_RISK_THRESHOLD,
};
pub use explanation::{explain, LOW_RISK_EXPLANATION};
pub use features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use follow_up::{
    follow_up_date, FollowUp, FollowUpStatus, RiskSummary, ScreeningRecord,
    FOLLOW_UP_TASK_MAX_MONTHS,
};
pub use recommendation::{
    recommend, CLOSE_MONITORING_ACTION, ROUTINE_SCREENING_ACTION, URGENT_REFERRAL_ACTION,
};
pub use rules::{rule_based_score, BASE_SCORE};
pub use screening::{
    BethesdaCategory, ClinicalInput, ContraceptiveUse, HivStatus, HpvVaccinationStatus,
    SmokingStatus, ViaResult,
};

/// Classify a score into a risk level.
#[must_use]
pub fn classify(score: f64) -> RiskLevel {
    RiskLevel::from_score(score)
}

#[cfg(test)]
pub(crate) use screening::tests::{baseline_input, for_each_grid_input};
