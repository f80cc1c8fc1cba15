//! Human-readable rationale for an assessment.

use super::screening::{ClinicalInput, SmokingStatus};

/// Emitted when no listed factor applies.
pub const LOW_RISK_EXPLANATION: &str =
    "Low risk based on current screening results and risk factors";

/// Re-derive the reasons behind a score from the raw inputs.
///
/// Order: clinical findings, then demographic and behavioural factors, then
/// protective factors. Never empty.
#[must_use]
pub fn explain(input: &ClinicalInput, _score: f64) -> Vec<String> {
    let mut reasons = Vec::new();

    if let Some(category) = input.high_grade_cytology() {
        reasons.push(format!("High-grade abnormal cells detected ({category})"));
    }
    if input.via_suspicious() {
        reasons.push("VIA test shows suspicious findings".to_string());
    }
    if input.hiv_positive() {
        reasons.push("HIV positive status increases risk".to_string());
    }

    if input.age > 50 {
        reasons.push("Age over 50 increases risk".to_string());
    }
    if input.number_of_sexual_partners > 4 {
        reasons.push("Multiple sexual partners increase risk".to_string());
    }
    if input.smoking_status == SmokingStatus::Current {
        reasons.push("Current smoking increases risk".to_string());
    }
    if input.family_history_cervical_cancer {
        reasons.push("Family history of cervical cancer".to_string());
    }

    if input.hpv_vaccinated() {
        reasons.push("HPV vaccination provides protection".to_string());
    }

    if reasons.is_empty() {
        reasons.push(LOW_RISK_EXPLANATION.to_string());
    }

    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::screening::tests::baseline_input;
    use crate::domain::screening::{
        BethesdaCategory, HivStatus, HpvVaccinationStatus, ViaResult,
    };

    #[test]
    fn test_default_message_when_no_factor() {
        assert_eq!(explain(&baseline_input(), 0.1), vec![LOW_RISK_EXPLANATION]);
    }

    #[test]
    fn test_factor_order() {
        let input = ClinicalInput {
            age: 60,
            number_of_sexual_partners: 6,
            hiv_status: HivStatus::Positive,
            hpv_vaccination_status: HpvVaccinationStatus::Vaccinated,
            smoking_status: SmokingStatus::Current,
            family_history_cervical_cancer: true,
            via_result: Some(ViaResult::Suspicious),
            bethesda_category: Some(BethesdaCategory::Hsil),
            ..baseline_input()
        };

        let reasons = explain(&input, 1.0);
        assert_eq!(
            reasons,
            vec![
                "High-grade abnormal cells detected (HSIL)",
                "VIA test shows suspicious findings",
                "HIV positive status increases risk",
                "Age over 50 increases risk",
                "Multiple sexual partners increase risk",
                "Current smoking increases risk",
                "Family history of cervical cancer",
                "HPV vaccination provides protection",
            ]
        );
    }

    #[test]
    fn test_protective_factor_alone_replaces_default() {
        let input = ClinicalInput {
            hpv_vaccination_status: HpvVaccinationStatus::Vaccinated,
            ..baseline_input()
        };
        assert_eq!(explain(&input, 0.0), vec!["HPV vaccination provides protection"]);
    }

    #[test]
    fn test_low_grade_cytology_not_listed() {
        let input = ClinicalInput {
            bethesda_category: Some(BethesdaCategory::Lsil),
            ..baseline_input()
        };
        assert_eq!(explain(&input, 0.3), vec![LOW_RISK_EXPLANATION]);
    }
}
