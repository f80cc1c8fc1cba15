//! Deterministic rule-based risk scoring.
//!
//! Always available; used when no model is loaded and whenever model
//! inference fails for a single call.

use super::screening::{ClinicalInput, SmokingStatus, ViaResult};

/// Score every patient starts from.
pub const BASE_SCORE: f64 = 0.10;

/// Score an input with the additive rule cascade.
///
/// A Bethesda result acts as a floor on the accumulated score rather than an
/// additive term. The result is clamped to [0, 1].
#[must_use]
pub fn rule_based_score(input: &ClinicalInput) -> f64 {
    let mut score = BASE_SCORE;

    if input.age > 50 {
        score += 0.20;
    } else if input.age > 35 {
        score += 0.10;
    }

    if input.age_at_first_intercourse < 16 {
        score += 0.15;
    }

    if input.number_of_sexual_partners > 4 {
        score += 0.20;
    } else if input.number_of_sexual_partners > 2 {
        score += 0.10;
    }

    if input.parity > 5 {
        score += 0.15;
    } else if input.parity > 3 {
        score += 0.10;
    }

    if input.hiv_positive() {
        score += 0.25;
    }

    // Protective
    if input.hpv_vaccinated() {
        score -= 0.10;
    }

    score += match input.smoking_status {
        SmokingStatus::Current => 0.15,
        SmokingStatus::Former => 0.05,
        SmokingStatus::Never => 0.0,
    };

    if input.family_history_cervical_cancer {
        score += 0.10;
    }

    if input.previous_abnormal_pap {
        score += 0.20;
    }

    score += match input.via_result {
        Some(ViaResult::Suspicious) => 0.40,
        Some(ViaResult::Positive) => 0.30,
        Some(ViaResult::Negative) | None => 0.0,
    };

    if let Some(floor) = input.bethesda_category.and_then(|c| c.score_floor()) {
        score = score.max(floor);
    }

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::screening::tests::{baseline_input, for_each_grid_input};
    use crate::domain::screening::{BethesdaCategory, HivStatus, HpvVaccinationStatus};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_baseline_is_base_score() {
        assert!(approx(rule_based_score(&baseline_input()), BASE_SCORE));
    }

    #[test]
    fn test_age_bands() {
        let at = |age| rule_based_score(&ClinicalInput { age, ..baseline_input() });
        assert!(approx(at(35), 0.10));
        assert!(approx(at(36), 0.20));
        assert!(approx(at(50), 0.20));
        assert!(approx(at(51), 0.30));
    }

    #[test]
    fn test_partner_and_parity_bands() {
        let input = ClinicalInput {
            number_of_sexual_partners: 3,
            parity: 4,
            ..baseline_input()
        };
        assert!(approx(rule_based_score(&input), 0.30));

        let input = ClinicalInput {
            number_of_sexual_partners: 5,
            parity: 6,
            ..baseline_input()
        };
        assert!(approx(rule_based_score(&input), 0.45));
    }

    #[test]
    fn test_vaccination_is_protective() {
        let input = ClinicalInput {
            hpv_vaccination_status: HpvVaccinationStatus::Vaccinated,
            ..baseline_input()
        };
        assert!(approx(rule_based_score(&input), 0.0));
    }

    #[test]
    fn test_bethesda_is_a_floor() {
        let cancer = ClinicalInput {
            bethesda_category: Some(BethesdaCategory::Cancer),
            ..baseline_input()
        };
        assert!(approx(rule_based_score(&cancer), 0.9));

        // Accumulated score above the floor is kept.
        let heavy = ClinicalInput {
            age: 60,
            hiv_status: HivStatus::Positive,
            via_result: Some(ViaResult::Suspicious),
            bethesda_category: Some(BethesdaCategory::Ascus),
            ..baseline_input()
        };
        assert!(approx(rule_based_score(&heavy), 0.95));

        let nilm = ClinicalInput {
            bethesda_category: Some(BethesdaCategory::Nilm),
            ..baseline_input()
        };
        assert!(approx(rule_based_score(&nilm), BASE_SCORE));
    }

    #[test]
    fn test_cancer_floor_holds_with_protective_factors() {
        let input = ClinicalInput {
            hpv_vaccination_status: HpvVaccinationStatus::Vaccinated,
            bethesda_category: Some(BethesdaCategory::Cancer),
            ..baseline_input()
        };
        assert!(rule_based_score(&input) >= 0.9);
    }

    #[test]
    fn test_score_is_capped() {
        let worst = ClinicalInput {
            age: 70,
            age_at_first_intercourse: 12,
            number_of_sexual_partners: 10,
            parity: 8,
            hiv_status: HivStatus::Positive,
            smoking_status: SmokingStatus::Current,
            family_history_cervical_cancer: true,
            previous_abnormal_pap: true,
            via_result: Some(ViaResult::Suspicious),
            bethesda_category: Some(BethesdaCategory::Cancer),
            ..baseline_input()
        };
        assert!(approx(rule_based_score(&worst), 1.0));
    }

    #[test]
    fn test_score_range_and_cancer_floor_across_inputs() {
        let mut visited = 0usize;
        for_each_grid_input(|input| {
            assert!(input.validate().is_ok(), "{input:?}");
            let score = rule_based_score(input);
            assert!((0.0..=1.0).contains(&score), "{score} for {input:?}");
            if input.bethesda_category == Some(BethesdaCategory::Cancer) {
                assert!(score >= 0.9, "{score} for {input:?}");
            }
            visited += 1;
        });
        assert_eq!(visited, 163_296);
    }
}
