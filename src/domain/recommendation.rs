//! Clinical recommendation from risk level and examination findings.
//!
//! Findings can escalate the recommendation beyond what the score alone
//! implies: a suspicious VIA or high-grade cytology always triggers urgent
//! referral.

use super::assessment::{Recommendation, RiskLevel};
use super::screening::ClinicalInput;

pub const URGENT_REFERRAL_ACTION: &str =
    "Urgent referral to specialist for colposcopy and biopsy. Immediate follow-up required.";

pub const CLOSE_MONITORING_ACTION: &str =
    "Repeat cytology in 6 months or refer for colposcopy. Close monitoring recommended.";

pub const ROUTINE_SCREENING_ACTION: &str = "Continue routine screening. Repeat screening in 3 years if low risk, or 1 year if any risk factors present.";

/// Routine screening interval.
const ROUTINE_INTERVAL_MONTHS: u32 = 36;

/// Routine screening interval for HIV-positive patients.
const HIV_ROUTINE_INTERVAL_MONTHS: u32 = 12;

/// Derive action, follow-up horizon and referral flag. First match wins.
#[must_use]
pub fn recommend(level: RiskLevel, input: &ClinicalInput) -> Recommendation {
    let cytology = input.bethesda_category;

    if level == RiskLevel::High
        || cytology.is_some_and(|c| c.is_high_grade())
        || input.via_suspicious()
    {
        return Recommendation {
            action: URGENT_REFERRAL_ACTION.to_string(),
            follow_up_months: 1,
            referral_needed: true,
        };
    }

    if level == RiskLevel::Moderate
        || cytology.is_some_and(|c| c.is_low_grade())
        || input.via_positive()
    {
        return Recommendation {
            action: CLOSE_MONITORING_ACTION.to_string(),
            follow_up_months: 6,
            referral_needed: true,
        };
    }

    let follow_up_months = if input.hiv_positive() {
        HIV_ROUTINE_INTERVAL_MONTHS
    } else {
        ROUTINE_INTERVAL_MONTHS
    };

    Recommendation {
        action: ROUTINE_SCREENING_ACTION.to_string(),
        follow_up_months,
        referral_needed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::screening::tests::baseline_input;
    use crate::domain::screening::{BethesdaCategory, HivStatus, ViaResult};

    #[test]
    fn test_level_drives_recommendation() {
        let input = baseline_input();

        let high = recommend(RiskLevel::High, &input);
        assert_eq!(high.follow_up_months, 1);
        assert!(high.referral_needed);

        let moderate = recommend(RiskLevel::Moderate, &input);
        assert_eq!(moderate.follow_up_months, 6);
        assert!(moderate.referral_needed);

        let low = recommend(RiskLevel::Low, &input);
        assert_eq!(low.follow_up_months, 36);
        assert!(!low.referral_needed);
        assert_eq!(low.action, ROUTINE_SCREENING_ACTION);
    }

    #[test]
    fn test_high_grade_findings_escalate_low_score() {
        for category in [BethesdaCategory::Hsil, BethesdaCategory::Agc, BethesdaCategory::Cancer] {
            let input = ClinicalInput {
                bethesda_category: Some(category),
                ..baseline_input()
            };
            let rec = recommend(RiskLevel::Low, &input);
            assert_eq!(rec.follow_up_months, 1, "{category}");
            assert!(rec.referral_needed);
        }

        let input = ClinicalInput {
            via_result: Some(ViaResult::Suspicious),
            ..baseline_input()
        };
        let rec = recommend(RiskLevel::Moderate, &input);
        assert_eq!(rec.follow_up_months, 1);
        assert_eq!(rec.action, URGENT_REFERRAL_ACTION);
    }

    #[test]
    fn test_low_grade_findings_escalate_to_monitoring() {
        for category in [BethesdaCategory::Ascus, BethesdaCategory::Lsil] {
            let input = ClinicalInput {
                bethesda_category: Some(category),
                ..baseline_input()
            };
            let rec = recommend(RiskLevel::Low, &input);
            assert_eq!(rec.follow_up_months, 6);
            assert!(rec.referral_needed);
        }

        let input = ClinicalInput {
            via_result: Some(ViaResult::Positive),
            ..baseline_input()
        };
        assert_eq!(recommend(RiskLevel::Low, &input).action, CLOSE_MONITORING_ACTION);
    }

    #[test]
    fn test_hiv_positive_shortens_routine_interval() {
        let input = ClinicalInput {
            hiv_status: HivStatus::Positive,
            ..baseline_input()
        };
        let rec = recommend(RiskLevel::Low, &input);
        assert_eq!(rec.follow_up_months, 12);
        assert!(!rec.referral_needed);
    }

    #[test]
    fn test_nilm_and_negative_via_do_not_escalate() {
        let input = ClinicalInput {
            via_result: Some(ViaResult::Negative),
            bethesda_category: Some(BethesdaCategory::Nilm),
            ..baseline_input()
        };
        assert!(!recommend(RiskLevel::Low, &input).referral_needed);
    }
}
