//! Risk assessment result types.
//!
//! Represents the output of the cervical cancer risk pipeline.

use serde::{Deserialize, Serialize};

/// Score at or above which a patient is classified HIGH.
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;

/// Score at or above which a patient is classified MODERATE.
pub const MODERATE_RISK_THRESHOLD: f64 = 0.4;

/// Risk level classification for cervical cancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Routine screening interval
    Low,
    /// Repeat cytology or colposcopy
    Moderate,
    /// Urgent specialist referral
    High,
}

impl RiskLevel {
    /// Classify a score in [0, 1]. Total: NaN classifies as LOW.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_RISK_THRESHOLD {
            Self::High
        } else if score >= MODERATE_RISK_THRESHOLD {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - Continue routine screening",
            Self::Moderate => "Moderate risk - Close monitoring recommended",
            Self::High => "High risk - Urgent specialist referral",
        }
    }

    /// Parse the stored upper-case code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "LOW" => Some(Self::Low),
            "MODERATE" => Some(Self::Moderate),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Which scoring path produced an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoringSource {
    /// Loaded statistical model
    Model,
    /// Deterministic rule cascade
    Rules,
    /// Pipeline failed; conservative fixed result
    Degraded,
}

impl ScoringSource {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Model => "MODEL",
            Self::Rules => "RULES",
            Self::Degraded => "DEGRADED",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "MODEL" => Some(Self::Model),
            "RULES" => Some(Self::Rules),
            "DEGRADED" => Some(Self::Degraded),
            _ => None,
        }
    }
}

/// Action, follow-up horizon and referral flag derived from a risk level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: String,
    pub follow_up_months: u32,
    pub referral_needed: bool,
}

/// Complete risk assessment for one screening event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Risk score in [0, 1], rounded to three decimals
    pub risk_score: f64,

    pub risk_level: RiskLevel,

    /// Fixed per scoring source
    pub confidence: f64,

    pub recommended_action: String,

    /// Months until the next screening or follow-up visit
    pub follow_up_months: u32,

    pub referral_needed: bool,

    /// Ordered rationale, never empty
    pub explanation: Vec<String>,

    pub scoring_source: ScoringSource,
}

/// Confidence reported by the degraded assessment.
pub const DEGRADED_CONFIDENCE: f64 = 0.5;

impl RiskAssessment {
    /// Conservative result returned when the pipeline cannot complete.
    #[must_use]
    pub fn degraded() -> Self {
        Self {
            risk_score: 0.5,
            risk_level: RiskLevel::Moderate,
            confidence: DEGRADED_CONFIDENCE,
            recommended_action:
                "Unable to complete risk assessment. Please consult healthcare provider."
                    .to_string(),
            follow_up_months: 6,
            referral_needed: true,
            explanation: vec!["Risk assessment incomplete due to technical error".to_string()],
            scoring_source: ScoringSource::Degraded,
        }
    }

    /// Whether the caller should schedule a follow-up task.
    #[must_use]
    pub fn needs_follow_up_task(&self) -> bool {
        self.follow_up_months <= super::follow_up::FOLLOW_UP_TASK_MAX_MONTHS
    }
}

/// Round a score to three decimal places.
#[must_use]
pub fn round_score(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_from_score() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.399), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.4), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(0.699), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(0.7), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(1.0), RiskLevel::High);
    }

    #[test]
    fn test_classification_is_monotonic() {
        let mut previous = RiskLevel::Low;
        for step in 0..=1000 {
            let level = RiskLevel::from_score(f64::from(step) / 1000.0);
            assert!(level >= previous);
            previous = level;
        }
    }

    #[test]
    fn test_description_names_level() {
        assert!(RiskLevel::Low.description().starts_with("Low risk"));
        assert!(RiskLevel::Moderate.description().starts_with("Moderate risk"));
        assert!(RiskLevel::High.description().contains("referral"));
    }

    #[test]
    fn test_degraded_assessment() {
        let degraded = RiskAssessment::degraded();
        assert_eq!(degraded.risk_level, RiskLevel::Moderate);
        assert!(degraded.referral_needed);
        assert!((degraded.confidence - 0.5).abs() < f64::EPSILON);
        assert_eq!(degraded.explanation.len(), 1);
        assert!(degraded.needs_follow_up_task());
    }

    #[test]
    fn test_round_score() {
        assert!((round_score(0.123_456) - 0.123).abs() < f64::EPSILON);
        assert!((round_score(0.300_000_000_000_000_04) - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_codes_roundtrip() {
        for level in [RiskLevel::Low, RiskLevel::Moderate, RiskLevel::High] {
            assert_eq!(RiskLevel::from_code(&level.to_string()), Some(level));
        }
        for source in [ScoringSource::Model, ScoringSource::Rules, ScoringSource::Degraded] {
            assert_eq!(ScoringSource::from_code(source.code()), Some(source));
        }
    }
}
