//! Feature encoding for the model-backed scoring path.

use serde::{Deserialize, Serialize};

use super::screening::{BethesdaCategory, ClinicalInput, SmokingStatus};

/// Number of slots in the encoded feature vector.
pub const FEATURE_COUNT: usize = 18;

/// Feature names in slot order. Model artifacts must list exactly these.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "age_at_first_intercourse",
    "number_of_sexual_partners",
    "parity",
    "hiv_positive",
    "hpv_vaccinated",
    "contraceptive_use_encoded",
    "smoking_current",
    "smoking_former",
    "family_history",
    "previous_abnormal_pap",
    "via_positive",
    "via_suspicious",
    "bethesda_ascus",
    "bethesda_lsil",
    "bethesda_hsil",
    "bethesda_agc",
    "bethesda_cancer",
];

/// Fixed-length numeric encoding of a [`ClinicalInput`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Encode a clinical input. Pure and infallible.
    #[must_use]
    pub fn encode(input: &ClinicalInput) -> Self {
        let mut slots = [0.0; FEATURE_COUNT];

        slots[0] = f64::from(input.age);
        slots[1] = f64::from(input.age_at_first_intercourse);
        slots[2] = f64::from(input.number_of_sexual_partners);
        slots[3] = f64::from(input.parity);
        slots[4] = flag(input.hiv_positive());
        slots[5] = flag(input.hpv_vaccinated());
        slots[6] = input.contraceptive_use.risk_code();
        slots[7] = flag(input.smoking_status == SmokingStatus::Current);
        slots[8] = flag(input.smoking_status == SmokingStatus::Former);
        slots[9] = flag(input.family_history_cervical_cancer);
        slots[10] = flag(input.previous_abnormal_pap);
        slots[11] = flag(input.via_positive());
        slots[12] = flag(input.via_suspicious());

        if let Some(slot) = input.bethesda_category.and_then(bethesda_slot) {
            slots[slot] = 1.0;
        }

        Self(slots)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Value at a named slot, if the name is known.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.0[i])
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// One-hot slot for a Bethesda category; NILM has none.
fn bethesda_slot(category: BethesdaCategory) -> Option<usize> {
    match category {
        BethesdaCategory::Nilm => None,
        BethesdaCategory::Ascus => Some(13),
        BethesdaCategory::Lsil => Some(14),
        BethesdaCategory::Hsil => Some(15),
        BethesdaCategory::Agc => Some(16),
        BethesdaCategory::Cancer => Some(17),
    }
}
