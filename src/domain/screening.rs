//! Clinical input types for cervical cancer risk assessment.
//!
//! One `ClinicalInput` is built per screening event from the patient's
//! demographics, history and the examination findings of that visit.

use serde::{Deserialize, Serialize};

/// HIV status as recorded at screening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HivStatus {
    Positive,
    Negative,
    Unknown,
}

/// HPV vaccination status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HpvVaccinationStatus {
    Vaccinated,
    NotVaccinated,
    Unknown,
}

/// Contraceptive method currently in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContraceptiveUse {
    None,
    OralPills,
    Injection,
    Iud,
    Barrier,
    Other,
}

impl ContraceptiveUse {
    /// Ordinal risk code used by the model feature vector.
    #[must_use]
    pub fn risk_code(&self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Barrier => 1.0,
            Self::Iud | Self::Other => 2.0,
            Self::Injection => 3.0,
            Self::OralPills => 4.0,
        }
    }
}

/// Smoking history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SmokingStatus {
    Never,
    Former,
    Current,
}

/// Visual Inspection with Acetic acid result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViaResult {
    Negative,
    Positive,
    Suspicious,
}

/// Bethesda cytology category, roughly ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BethesdaCategory {
    /// Negative for intraepithelial lesion or malignancy
    Nilm,
    /// Atypical squamous cells of undetermined significance
    Ascus,
    /// Low-grade squamous intraepithelial lesion
    Lsil,
    /// High-grade squamous intraepithelial lesion
    Hsil,
    /// Atypical glandular cells
    Agc,
    /// Squamous cell carcinoma
    Cancer,
}

impl BethesdaCategory {
    /// High-grade findings that always warrant urgent referral.
    #[must_use]
    pub fn is_high_grade(&self) -> bool {
        matches!(self, Self::Hsil | Self::Agc | Self::Cancer)
    }

    /// Low-grade findings that warrant repeat cytology or colposcopy.
    #[must_use]
    pub fn is_low_grade(&self) -> bool {
        matches!(self, Self::Ascus | Self::Lsil)
    }

    /// Minimum rule-based score implied by this cytology result.
    #[must_use]
    pub fn score_floor(&self) -> Option<f64> {
        match self {
            Self::Nilm => None,
            Self::Ascus => Some(0.2),
            Self::Lsil => Some(0.3),
            Self::Agc => Some(0.5),
            Self::Hsil => Some(0.6),
            Self::Cancer => Some(0.9),
        }
    }

    /// Short code as reported on the cytology form.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Nilm => "NILM",
            Self::Ascus => "ASCUS",
            Self::Lsil => "LSIL",
            Self::Hsil => "HSIL",
            Self::Agc => "AGC",
            Self::Cancer => "CANCER",
        }
    }
}

impl std::fmt::Display for BethesdaCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Screening inputs for a single patient visit.
///
/// Every field is required; optional examination results are `None` when
/// the test was not performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalInput {
    /// Age in completed years (15-80)
    pub age: u32,

    /// Age at first sexual intercourse (10-50)
    pub age_at_first_intercourse: u32,

    /// Lifetime number of sexual partners (>= 1)
    pub number_of_sexual_partners: u32,

    /// Number of pregnancies
    pub parity: u32,

    pub hiv_status: HivStatus,
    pub hpv_vaccination_status: HpvVaccinationStatus,
    pub contraceptive_use: ContraceptiveUse,
    pub smoking_status: SmokingStatus,
    pub family_history_cervical_cancer: bool,
    pub previous_abnormal_pap: bool,

    #[serde(default)]
    pub via_result: Option<ViaResult>,

    #[serde(default)]
    pub bethesda_category: Option<BethesdaCategory>,
}

/// Accepted range for `age`.
pub const AGE_RANGE: std::ops::RangeInclusive<u32> = 15..=80;

/// Accepted range for `age_at_first_intercourse`.
pub const FIRST_INTERCOURSE_AGE_RANGE: std::ops::RangeInclusive<u32> = 10..=50;

/// Accepted range for `number_of_sexual_partners`.
pub const PARTNERS_RANGE: std::ops::RangeInclusive<u32> = 1..=20;

/// Upper bound for `parity`.
pub const MAX_PARITY: u32 = 15;

impl ClinicalInput {
    /// Validate numeric fields against their accepted ranges.
    ///
    /// Enum fields are already constrained by their types.
    ///
    /// # Errors
    /// Returns all validation errors found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !AGE_RANGE.contains(&self.age) {
            errors.push(format!(
                "Age {} out of range [{}, {}]",
                self.age,
                AGE_RANGE.start(),
                AGE_RANGE.end()
            ));
        }
        if !FIRST_INTERCOURSE_AGE_RANGE.contains(&self.age_at_first_intercourse) {
            errors.push(format!(
                "Age at first intercourse {} out of range [{}, {}]",
                self.age_at_first_intercourse,
                FIRST_INTERCOURSE_AGE_RANGE.start(),
                FIRST_INTERCOURSE_AGE_RANGE.end()
            ));
        }
        if !PARTNERS_RANGE.contains(&self.number_of_sexual_partners) {
            errors.push(format!(
                "Number of sexual partners {} out of range [{}, {}]",
                self.number_of_sexual_partners,
                PARTNERS_RANGE.start(),
                PARTNERS_RANGE.end()
            ));
        }
        if self.parity > MAX_PARITY {
            errors.push(format!(
                "Parity {} out of range [0, {}]",
                self.parity, MAX_PARITY
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// True when the VIA examination was suspicious for cancer.
    #[must_use]
    pub fn via_suspicious(&self) -> bool {
        self.via_result == Some(ViaResult::Suspicious)
    }

    /// True when the VIA examination was positive (not suspicious).
    #[must_use]
    pub fn via_positive(&self) -> bool {
        self.via_result == Some(ViaResult::Positive)
    }

    /// The Bethesda category when it is HSIL, AGC or CANCER.
    #[must_use]
    pub fn high_grade_cytology(&self) -> Option<BethesdaCategory> {
        self.bethesda_category.filter(BethesdaCategory::is_high_grade)
    }

    #[must_use]
    pub fn hiv_positive(&self) -> bool {
        self.hiv_status == HivStatus::Positive
    }

    #[must_use]
    pub fn hpv_vaccinated(&self) -> bool {
        self.hpv_vaccination_status == HpvVaccinationStatus::Vaccinated
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Visit every combination of categorical values and rule band edges.
    pub(crate) fn for_each_grid_input(mut visit: impl FnMut(&ClinicalInput)) {
        const AGES: [u32; 3] = [35, 36, 51];
        const FIRST_INTERCOURSE: [u32; 2] = [15, 16];
        const PARTNERS: [u32; 3] = [2, 3, 5];
        const PARITIES: [u32; 3] = [3, 4, 6];
        const HIV: [HivStatus; 3] = [HivStatus::Positive, HivStatus::Negative, HivStatus::Unknown];
        const HPV: [HpvVaccinationStatus; 3] = [
            HpvVaccinationStatus::Vaccinated,
            HpvVaccinationStatus::NotVaccinated,
            HpvVaccinationStatus::Unknown,
        ];
        const SMOKING: [SmokingStatus; 3] =
            [SmokingStatus::Never, SmokingStatus::Former, SmokingStatus::Current];
        const VIA: [Option<ViaResult>; 4] = [
            None,
            Some(ViaResult::Negative),
            Some(ViaResult::Positive),
            Some(ViaResult::Suspicious),
        ];
        const BETHESDA: [Option<BethesdaCategory>; 7] = [
            None,
            Some(BethesdaCategory::Nilm),
            Some(BethesdaCategory::Ascus),
            Some(BethesdaCategory::Lsil),
            Some(BethesdaCategory::Hsil),
            Some(BethesdaCategory::Agc),
            Some(BethesdaCategory::Cancer),
        ];

        let mut input = baseline_input();
        for age in AGES {
            input.age = age;
            for afi in FIRST_INTERCOURSE {
                input.age_at_first_intercourse = afi;
                for partners in PARTNERS {
                    input.number_of_sexual_partners = partners;
                    for parity in PARITIES {
                        input.parity = parity;
                        for hiv in HIV {
                            input.hiv_status = hiv;
                            for hpv in HPV {
                                input.hpv_vaccination_status = hpv;
                                for smoking in SMOKING {
                                    input.smoking_status = smoking;
                                    for flags in 0..4u8 {
                                        input.family_history_cervical_cancer = flags & 1 != 0;
                                        input.previous_abnormal_pap = flags & 2 != 0;
                                        for via in VIA {
                                            input.via_result = via;
                                            for bethesda in BETHESDA {
                                                input.bethesda_category = bethesda;
                                                visit(&input);
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Lowest-risk input that still passes validation.
    pub(crate) fn baseline_input() -> ClinicalInput {
        ClinicalInput {
            age: 30,
            age_at_first_intercourse: 20,
            number_of_sexual_partners: 1,
            parity: 0,
            hiv_status: HivStatus::Negative,
            hpv_vaccination_status: HpvVaccinationStatus::NotVaccinated,
            contraceptive_use: ContraceptiveUse::None,
            smoking_status: SmokingStatus::Never,
            family_history_cervical_cancer: false,
            previous_abnormal_pap: false,
            via_result: None,
            bethesda_category: None,
        }
    }

    #[test]
    fn test_validation() {
        assert!(baseline_input().validate().is_ok());

        let invalid = ClinicalInput {
            age: 12,
            age_at_first_intercourse: 9,
            number_of_sexual_partners: 0,
            ..baseline_input()
        };
        let errors = invalid.validate().expect_err("Should reject");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_partner_and_parity_upper_bounds() {
        let input = ClinicalInput {
            number_of_sexual_partners: 21,
            parity: 16,
            ..baseline_input()
        };
        assert_eq!(input.validate().expect_err("Should reject").len(), 2);

        let edge = ClinicalInput {
            age: 80,
            age_at_first_intercourse: 50,
            number_of_sexual_partners: 20,
            parity: 15,
            ..baseline_input()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_deserialize_wire_format() {
        let json = r#"{
            "age": 42,
            "age_at_first_intercourse": 17,
            "number_of_sexual_partners": 3,
            "parity": 4,
            "hiv_status": "UNKNOWN",
            "hpv_vaccination_status": "NOT_VACCINATED",
            "contraceptive_use": "ORAL_PILLS",
            "smoking_status": "FORMER",
            "family_history_cervical_cancer": true,
            "previous_abnormal_pap": false,
            "via_result": "POSITIVE",
            "bethesda_category": "LSIL"
        }"#;

        let input: ClinicalInput = serde_json::from_str(json).expect("Should parse");
        assert_eq!(input.contraceptive_use, ContraceptiveUse::OralPills);
        assert_eq!(input.bethesda_category, Some(BethesdaCategory::Lsil));
        assert!(input.via_positive());
    }

    #[test]
    fn test_optional_results_default_to_absent() {
        let json = r#"{
            "age": 42,
            "age_at_first_intercourse": 17,
            "number_of_sexual_partners": 3,
            "parity": 4,
            "hiv_status": "NEGATIVE",
            "hpv_vaccination_status": "UNKNOWN",
            "contraceptive_use": "IUD",
            "smoking_status": "NEVER",
            "family_history_cervical_cancer": false,
            "previous_abnormal_pap": false
        }"#;

        let input: ClinicalInput = serde_json::from_str(json).expect("Should parse");
        assert!(input.via_result.is_none());
        assert!(input.bethesda_category.is_none());
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let json = r#"{"age": 42, "age_at_first_intercourse": 17,
            "number_of_sexual_partners": 3, "parity": 4, "hiv_status": "MAYBE",
            "hpv_vaccination_status": "UNKNOWN", "contraceptive_use": "IUD",
            "smoking_status": "NEVER", "family_history_cervical_cancer": false,
            "previous_abnormal_pap": false}"#;
        assert!(serde_json::from_str::<ClinicalInput>(json).is_err());
    }

    #[test]
    fn test_high_grade_cytology() {
        let input = ClinicalInput {
            bethesda_category: Some(BethesdaCategory::Agc),
            ..baseline_input()
        };
        assert_eq!(input.high_grade_cytology(), Some(BethesdaCategory::Agc));

        let input = ClinicalInput {
            bethesda_category: Some(BethesdaCategory::Lsil),
            ..baseline_input()
        };
        assert_eq!(input.high_grade_cytology(), None);
    }
}
