//! Screening records and follow-up tasks created after an assessment.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::assessment::{RiskAssessment, RiskLevel};
use super::screening::ClinicalInput;

/// Assessments with a follow-up horizon at or below this get a follow-up task.
pub const FOLLOW_UP_TASK_MAX_MONTHS: u32 = 12;

/// Days counted per follow-up month.
const DAYS_PER_MONTH: i64 = 30;

/// Date of the follow-up visit for a horizon in months.
#[must_use]
pub fn follow_up_date(from: NaiveDate, months: u32) -> NaiveDate {
    from + Duration::days(i64::from(months) * DAYS_PER_MONTH)
}

/// Status of a follow-up task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FollowUpStatus {
    Pending,
    /// Patient reached by a health worker
    Contacted,
    Completed,
    /// Patient missed the appointment
    Missed,
    /// Lost to follow-up
    Lost,
}

impl FollowUpStatus {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Contacted => "CONTACTED",
            Self::Completed => "COMPLETED",
            Self::Missed => "MISSED",
            Self::Lost => "LOST",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "PENDING" => Some(Self::Pending),
            "CONTACTED" => Some(Self::Contacted),
            "COMPLETED" => Some(Self::Completed),
            "MISSED" => Some(Self::Missed),
            "LOST" => Some(Self::Lost),
            _ => None,
        }
    }
}

impl std::fmt::Display for FollowUpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Persisted pair of screening input and its assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningRecord {
    pub id: String,
    pub patient_id: String,
    pub input: ClinicalInput,
    pub assessment: RiskAssessment,
    pub screened_at: chrono::DateTime<chrono::Utc>,
}

impl ScreeningRecord {
    #[must_use]
    pub fn new(patient_id: impl Into<String>, input: ClinicalInput, assessment: RiskAssessment) -> Self {
        Self {
            id: uuid_v4(),
            patient_id: patient_id.into(),
            input,
            assessment,
            screened_at: chrono::Utc::now(),
        }
    }

    /// Follow-up task for this record, when its horizon warrants one.
    #[must_use]
    pub fn follow_up(&self) -> Option<FollowUp> {
        if !self.assessment.needs_follow_up_task() {
            return None;
        }
        let due = follow_up_date(
            self.screened_at.date_naive(),
            self.assessment.follow_up_months,
        );
        Some(FollowUp {
            id: uuid_v4(),
            screening_id: self.id.clone(),
            due_date: due,
            status: FollowUpStatus::Pending,
            notes: String::new(),
        })
    }
}

/// A scheduled follow-up visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub id: String,
    pub screening_id: String,
    pub due_date: NaiveDate,
    pub status: FollowUpStatus,
    pub notes: String,
}

impl FollowUp {
    /// Pending and past its due date.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == FollowUpStatus::Pending && self.due_date < today
    }
}

/// Aggregate counts over stored screenings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total_screenings: usize,
    pub high_risk_count: usize,
    pub moderate_risk_count: usize,
    pub low_risk_count: usize,
    pub referrals_made: usize,
    pub follow_ups_pending: usize,
}

impl RiskSummary {
    /// Tally a set of records.
    #[must_use]
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a ScreeningRecord>,
        follow_ups_pending: usize,
    ) -> Self {
        let mut summary = Self {
            follow_ups_pending,
            ..Self::default()
        };
        for record in records {
            summary.total_screenings += 1;
            match record.assessment.risk_level {
                RiskLevel::High => summary.high_risk_count += 1,
                RiskLevel::Moderate => summary.moderate_risk_count += 1,
                RiskLevel::Low => summary.low_risk_count += 1,
            }
            if record.assessment.referral_needed {
                summary.referrals_made += 1;
            }
        }
        summary
    }

    /// Share of screenings classified HIGH, in percent.
    #[must_use]
    pub fn high_risk_percentage(&self) -> f64 {
        if self.total_screenings == 0 {
            return 0.0;
        }
        self.high_risk_count as f64 * 100.0 / self.total_screenings as f64
    }
}

/// Generate a random UUID v4 string from a CSPRNG.
pub(crate) fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}
