//! Screening service: Records screenings and tracks follow-up visits.
//!
//! This service coordinates:
//! - Input validation
//! - Risk prediction
//! - Storage persistence
//! - Follow-up scheduling

use std::sync::Arc;

use chrono::NaiveDate;

use crate::application::RiskPredictor;
use crate::domain::{ClinicalInput, FollowUp, FollowUpStatus, RiskSummary, ScreeningRecord};
use crate::ports::ScreeningStore;
use crate::CervicareError;

/// Page size used when tallying the whole screening history.
const SUMMARY_PAGE_SIZE: usize = 500;

/// Result of submitting one screening.
#[derive(Debug, Clone)]
pub struct ScreeningOutcome {
    pub record: ScreeningRecord,
    /// Scheduled visit, present when the follow-up horizon is short
    pub follow_up: Option<FollowUp>,
    /// False when the assessment was produced but could not be saved
    pub stored: bool,
}

/// Service for recording screenings.
pub struct ScreeningService<S>
where
    S: ScreeningStore,
{
    predictor: Arc<RiskPredictor>,
    storage: Arc<S>,
}

impl<S> ScreeningService<S>
where
    S: ScreeningStore,
    S::Error: Into<crate::adapters::StorageError>,
{
    /// Create a new screening service.
    pub fn new(predictor: Arc<RiskPredictor>, storage: Arc<S>) -> Self {
        Self { predictor, storage }
    }

    #[must_use]
    pub fn predictor(&self) -> &RiskPredictor {
        &self.predictor
    }

    /// Validate, assess and record a screening.
    ///
    /// A storage failure after prediction is logged and reported through
    /// `ScreeningOutcome::stored`; the assessment is still returned.
    ///
    /// # Errors
    /// Returns `CervicareError::Validation` if the input is out of range or
    /// the patient ID is empty.
    pub fn submit(
        &self,
        patient_id: &str,
        input: ClinicalInput,
    ) -> Result<ScreeningOutcome, CervicareError> {
        let patient_id = patient_id.trim();
        if patient_id.is_empty() {
            return Err(CervicareError::Validation("patient ID is required".into()));
        }
        input
            .validate()
            .map_err(|errors| CervicareError::Validation(errors.join("; ")))?;

        tracing::debug!("Assessing screening input...");
        let assessment = self.predictor.predict(&input);
        let record = ScreeningRecord::new(patient_id, input, assessment);
        let follow_up = record.follow_up();

        let stored = match self.persist(&record, follow_up.as_ref()) {
            Ok(()) => {
                tracing::info!(
                    "Screening recorded: {} (referral={}, follow_up={} months)",
                    record.assessment.risk_level.description(),
                    record.assessment.referral_needed,
                    record.assessment.follow_up_months
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    "Failed to save screening {}: {e}; returning {} unrecorded",
                    record.id,
                    record.assessment.risk_level.description()
                );
                false
            }
        };

        Ok(ScreeningOutcome {
            record,
            follow_up,
            stored,
        })
    }

    fn persist(
        &self,
        record: &ScreeningRecord,
        follow_up: Option<&FollowUp>,
    ) -> Result<(), CervicareError> {
        self.storage
            .save_screening(record)
            .map_err(|e| CervicareError::Storage(e.into()))?;
        if let Some(follow_up) = follow_up {
            self.storage
                .save_follow_up(follow_up)
                .map_err(|e| CervicareError::Storage(e.into()))?;
        }
        Ok(())
    }

    /// Most recent screenings, newest first.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn recent_screenings(&self, limit: usize) -> Result<Vec<ScreeningRecord>, CervicareError> {
        self.storage
            .load_recent_screenings(limit)
            .map_err(|e| CervicareError::Storage(e.into()))
    }

    /// All screenings recorded for one patient, newest first.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn patient_history(&self, patient_id: &str) -> Result<Vec<ScreeningRecord>, CervicareError> {
        self.storage
            .load_patient_screenings(patient_id)
            .map_err(|e| CervicareError::Storage(e.into()))
    }

    /// # Errors
    /// Returns error if storage fails.
    pub fn screening_count(&self) -> Result<usize, CervicareError> {
        self.storage
            .count_screenings()
            .map_err(|e| CervicareError::Storage(e.into()))
    }

    /// Follow-ups still waiting to be actioned, earliest due first.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn pending_follow_ups(&self) -> Result<Vec<FollowUp>, CervicareError> {
        self.storage
            .load_follow_ups(FollowUpStatus::Pending)
            .map_err(|e| CervicareError::Storage(e.into()))
    }

    /// Pending follow-ups whose due date is before `today`.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn overdue_follow_ups(&self, today: NaiveDate) -> Result<Vec<FollowUp>, CervicareError> {
        self.storage
            .load_overdue_follow_ups(today)
            .map_err(|e| CervicareError::Storage(e.into()))
    }

    /// Record the outcome of a follow-up contact.
    ///
    /// # Errors
    /// Returns `CervicareError::NotFound` if no follow-up has this ID.
    pub fn update_follow_up_status(
        &self,
        id: &str,
        status: FollowUpStatus,
        notes: &str,
    ) -> Result<(), CervicareError> {
        let updated = self
            .storage
            .update_follow_up_status(id, status, notes)
            .map_err(|e| CervicareError::Storage(e.into()))?;
        if !updated {
            return Err(CervicareError::NotFound(format!("follow-up {id}")));
        }
        tracing::info!("Follow-up {id} marked {status}");
        Ok(())
    }

    /// Counts per risk level and referrals over all stored screenings.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn summary(&self) -> Result<RiskSummary, CervicareError> {
        let mut records = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .storage
                .load_screenings_paginated(offset, SUMMARY_PAGE_SIZE)
                .map_err(|e| CervicareError::Storage(e.into()))?;
            let next = page.next_offset();
            records.extend(page.items);
            match next {
                Some(n) => offset = n,
                None => break,
            }
        }

        let pending = self.pending_follow_ups()?.len();
        Ok(RiskSummary::from_records(&records, pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStorage;
    use crate::adapters::StorageError;
    use crate::config::PredictorConfig;
    use crate::domain::{baseline_input, BethesdaCategory, RiskLevel, ViaResult};
    use crate::ports::ScreeningPage;

    fn service() -> ScreeningService<SqliteStorage> {
        let predictor = Arc::new(RiskPredictor::rules_only(&PredictorConfig::default()));
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        ScreeningService::new(predictor, storage)
    }

    fn referral_input() -> ClinicalInput {
        ClinicalInput {
            bethesda_category: Some(BethesdaCategory::Hsil),
            ..baseline_input()
        }
    }

    #[test]
    fn test_submit_persists_and_schedules_follow_up() {
        let service = service();
        let outcome = service
            .submit("patient-7", referral_input())
            .expect("Should submit");

        assert!(outcome.stored);
        assert_eq!(outcome.record.assessment.follow_up_months, 1);
        let follow_up = outcome.follow_up.expect("Should schedule follow-up");
        assert_eq!(
            follow_up.due_date,
            outcome.record.screened_at.date_naive() + chrono::Duration::days(30)
        );
        assert_eq!(follow_up.status, FollowUpStatus::Pending);

        assert_eq!(service.screening_count().expect("Should count"), 1);
        assert_eq!(service.pending_follow_ups().expect("Should load"), vec![follow_up]);
        assert_eq!(service.patient_history("patient-7").expect("Should load").len(), 1);
    }

    #[test]
    fn test_routine_result_has_no_follow_up_task() {
        let service = service();
        let outcome = service.submit("p", baseline_input()).expect("Should submit");
        assert_eq!(outcome.record.assessment.follow_up_months, 36);
        assert!(outcome.follow_up.is_none());
        assert!(service.pending_follow_ups().expect("Should load").is_empty());
    }

    #[test]
    fn test_invalid_input_rejected_before_scoring() {
        let service = service();
        let input = ClinicalInput {
            age: 12,
            ..baseline_input()
        };
        assert!(matches!(
            service.submit("p", input),
            Err(CervicareError::Validation(_))
        ));
        assert!(matches!(
            service.submit("  ", baseline_input()),
            Err(CervicareError::Validation(_))
        ));
        assert_eq!(service.screening_count().expect("Should count"), 0);
    }

    #[test]
    fn test_follow_up_status_updates() {
        let service = service();
        let outcome = service.submit("p", referral_input()).expect("Should submit");
        let follow_up = outcome.follow_up.expect("Should schedule follow-up");

        let after_due = follow_up.due_date + chrono::Duration::days(1);
        assert_eq!(service.overdue_follow_ups(after_due).expect("Should load").len(), 1);

        service
            .update_follow_up_status(&follow_up.id, FollowUpStatus::Completed, "Colposcopy done")
            .expect("Should update");
        assert!(service.overdue_follow_ups(after_due).expect("Should load").is_empty());

        assert!(matches!(
            service.update_follow_up_status("missing", FollowUpStatus::Lost, ""),
            Err(CervicareError::NotFound(_))
        ));
    }

    #[test]
    fn test_summary_counts() {
        let service = service();
        service.submit("a", baseline_input()).expect("Should submit");
        service.submit("b", referral_input()).expect("Should submit");
        service
            .submit(
                "c",
                ClinicalInput {
                    via_result: Some(ViaResult::Positive),
                    ..baseline_input()
                },
            )
            .expect("Should submit");

        let summary = service.summary().expect("Should summarize");
        assert_eq!(summary.total_screenings, 3);
        assert_eq!(summary.low_risk_count, 1);
        assert_eq!(summary.moderate_risk_count, 2);
        assert_eq!(summary.high_risk_count, 0);
        assert_eq!(summary.referrals_made, 2);
        assert_eq!(summary.follow_ups_pending, 2);

        let recent = service.recent_screenings(10).expect("Should load");
        assert_eq!(recent.len(), 3);
        assert!(recent.iter().any(|r| r.assessment.risk_level == RiskLevel::Moderate));
    }

    struct BrokenStore;

    impl ScreeningStore for BrokenStore {
        type Error = StorageError;

        fn save_screening(&self, _record: &ScreeningRecord) -> Result<(), Self::Error> {
            Err(StorageError::LockPoisoned)
        }
        fn load_screening(&self, _id: &str) -> Result<Option<ScreeningRecord>, Self::Error> {
            Ok(None)
        }
        fn load_recent_screenings(&self, _limit: usize) -> Result<Vec<ScreeningRecord>, Self::Error> {
            Ok(Vec::new())
        }
        fn load_patient_screenings(&self, _patient_id: &str) -> Result<Vec<ScreeningRecord>, Self::Error> {
            Ok(Vec::new())
        }
        fn load_screenings_paginated(&self, offset: usize, limit: usize) -> Result<ScreeningPage, Self::Error> {
            Ok(ScreeningPage::new(Vec::new(), 0, offset, limit))
        }
        fn count_screenings(&self) -> Result<usize, Self::Error> {
            Ok(0)
        }
        fn save_follow_up(&self, _follow_up: &FollowUp) -> Result<(), Self::Error> {
            Err(StorageError::LockPoisoned)
        }
        fn load_follow_ups(&self, _status: FollowUpStatus) -> Result<Vec<FollowUp>, Self::Error> {
            Ok(Vec::new())
        }
        fn load_overdue_follow_ups(&self, _today: NaiveDate) -> Result<Vec<FollowUp>, Self::Error> {
            Ok(Vec::new())
        }
        fn update_follow_up_status(
            &self,
            _id: &str,
            _status: FollowUpStatus,
            _notes: &str,
        ) -> Result<bool, Self::Error> {
            Ok(false)
        }
    }

    #[test]
    fn test_storage_failure_still_returns_assessment() {
        let predictor = Arc::new(RiskPredictor::rules_only(&PredictorConfig::default()));
        let service = ScreeningService::new(predictor, Arc::new(BrokenStore));

        let outcome = service.submit("p", referral_input()).expect("Should submit");
        assert!(!outcome.stored);
        assert!(outcome.record.assessment.referral_needed);
    }

    #[derive(Clone, Default)]
    struct LogCapture(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("log lock").extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn submit_with_logs<S>(service: &ScreeningService<S>) -> (ScreeningOutcome, String)
    where
        S: ScreeningStore,
        S::Error: Into<StorageError>,
    {
        let capture = LogCapture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer({
                let c = capture.clone();
                move || c.clone()
            })
            .finish();
        let outcome = tracing::subscriber::with_default(subscriber, || {
            service.submit("p", referral_input()).expect("Should submit")
        });
        let logs = String::from_utf8(capture.0.lock().expect("log lock").clone()).expect("utf8");
        (outcome, logs)
    }

    #[test]
    fn test_recorded_log_only_after_successful_save() {
        let predictor = Arc::new(RiskPredictor::rules_only(&PredictorConfig::default()));

        let broken = ScreeningService::new(predictor.clone(), Arc::new(BrokenStore));
        let (outcome, logs) = submit_with_logs(&broken);
        assert!(!outcome.stored);
        assert!(!logs.contains("Screening recorded"));
        assert!(logs.contains("unrecorded"));

        let storage = Arc::new(SqliteStorage::in_memory().expect("storage"));
        let working = ScreeningService::new(predictor, storage);
        let (outcome, logs) = submit_with_logs(&working);
        assert!(outcome.stored);
        assert!(logs.contains("Screening recorded"));
    }
}
