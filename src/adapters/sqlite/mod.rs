//! SQLite adapter: Implementation of ScreeningStore.
//!
//! Provides local persistence for screening records and follow-up tasks.
//!
//! # Mutex Behavior
//!
//! The connection is protected by a `Mutex`. A poisoned mutex (from a panic in
//! another thread) surfaces as `StorageError::LockPoisoned` rather than
//! panicking the caller.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{
    ClinicalInput, FollowUp, FollowUpStatus, RiskAssessment, RiskLevel, ScoringSource,
    ScreeningRecord,
};
use crate::ports::{ScreeningPage, ScreeningStore};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

const SCREENING_COLUMNS: &str = "id, patient_id, input_json, risk_score, risk_level, confidence, \
     recommended_action, follow_up_months, referral_needed, explanation_json, scoring_source, screened_at";

/// SQLite storage adapter.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) a database file.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database.
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS screenings (
                id TEXT PRIMARY KEY,
                patient_id TEXT NOT NULL,
                input_json TEXT NOT NULL,
                risk_score REAL NOT NULL,
                risk_level TEXT NOT NULL,
                confidence REAL NOT NULL,
                recommended_action TEXT NOT NULL,
                follow_up_months INTEGER NOT NULL,
                referral_needed INTEGER NOT NULL,
                explanation_json TEXT NOT NULL,
                scoring_source TEXT NOT NULL,
                screened_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_screenings_screened
                ON screenings(screened_at DESC);
            CREATE INDEX IF NOT EXISTS idx_screenings_patient
                ON screenings(patient_id);

            CREATE TABLE IF NOT EXISTS follow_ups (
                id TEXT PRIMARY KEY,
                screening_id TEXT NOT NULL REFERENCES screenings(id) ON DELETE CASCADE,
                due_date TEXT NOT NULL,
                status TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_follow_ups_due
                ON follow_ups(status, due_date);
            ",
        )?;

        Ok(())
    }

    fn query_screenings(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<ScreeningRecord>, StorageError> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, RawScreening::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawScreening::into_record).collect()
    }

    fn query_follow_ups(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<FollowUp>, StorageError> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, screening_id, due, status, notes)| {
                let due_date = NaiveDate::parse_from_str(&due, "%Y-%m-%d")
                    .map_err(|e| StorageError::Serialization(format!("due_date: {e}")))?;
                let status = FollowUpStatus::from_code(&status).ok_or_else(|| {
                    StorageError::Serialization(format!("unknown follow-up status {status}"))
                })?;
                Ok(FollowUp {
                    id,
                    screening_id,
                    due_date,
                    status,
                    notes,
                })
            })
            .collect()
    }
}

/// Column values of one `screenings` row before decoding.
struct RawScreening {
    id: String,
    patient_id: String,
    input_json: String,
    risk_score: f64,
    risk_level: String,
    confidence: f64,
    recommended_action: String,
    follow_up_months: i64,
    referral_needed: i64,
    explanation_json: String,
    scoring_source: String,
    screened_at: String,
}

impl RawScreening {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            input_json: row.get(2)?,
            risk_score: row.get(3)?,
            risk_level: row.get(4)?,
            confidence: row.get(5)?,
            recommended_action: row.get(6)?,
            follow_up_months: row.get(7)?,
            referral_needed: row.get(8)?,
            explanation_json: row.get(9)?,
            scoring_source: row.get(10)?,
            screened_at: row.get(11)?,
        })
    }

    fn into_record(self) -> Result<ScreeningRecord, StorageError> {
        let input: ClinicalInput = serde_json::from_str(&self.input_json)
            .map_err(|e| StorageError::Serialization(format!("input_json: {e}")))?;
        let explanation: Vec<String> = serde_json::from_str(&self.explanation_json)
            .map_err(|e| StorageError::Serialization(format!("explanation_json: {e}")))?;
        let risk_level = RiskLevel::from_code(&self.risk_level).ok_or_else(|| {
            StorageError::Serialization(format!("unknown risk level {}", self.risk_level))
        })?;
        let scoring_source = ScoringSource::from_code(&self.scoring_source).ok_or_else(|| {
            StorageError::Serialization(format!("unknown scoring source {}", self.scoring_source))
        })?;
        let screened_at = chrono::DateTime::parse_from_rfc3339(&self.screened_at)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| StorageError::Serialization(format!("screened_at: {e}")))?;
        let follow_up_months = u32::try_from(self.follow_up_months).map_err(|_| {
            StorageError::Serialization(format!(
                "follow_up_months out of range: {}",
                self.follow_up_months
            ))
        })?;

        Ok(ScreeningRecord {
            id: self.id,
            patient_id: self.patient_id,
            input,
            assessment: RiskAssessment {
                risk_score: self.risk_score,
                risk_level,
                confidence: self.confidence,
                recommended_action: self.recommended_action,
                follow_up_months,
                referral_needed: self.referral_needed != 0,
                explanation,
                scoring_source,
            },
            screened_at,
        })
    }
}

impl ScreeningStore for SqliteStorage {
    type Error = StorageError;

    fn save_screening(&self, record: &ScreeningRecord) -> Result<(), Self::Error> {
        let input_json = serde_json::to_string(&record.input)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let explanation_json = serde_json::to_string(&record.assessment.explanation)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let a = &record.assessment;

        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO screenings ({SCREENING_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            params![
                record.id,
                record.patient_id,
                input_json,
                a.risk_score,
                a.risk_level.to_string(),
                a.confidence,
                a.recommended_action,
                i64::from(a.follow_up_months),
                i64::from(a.referral_needed),
                explanation_json,
                a.scoring_source.code(),
                record.screened_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!("Saved screening {} to storage", record.id);
        Ok(())
    }

    fn load_screening(&self, id: &str) -> Result<Option<ScreeningRecord>, Self::Error> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                &format!("SELECT {SCREENING_COLUMNS} FROM screenings WHERE id = ?1"),
                params![id],
                RawScreening::from_row,
            )
            .optional()?;
        raw.map(RawScreening::into_record).transpose()
    }

    fn load_recent_screenings(&self, limit: usize) -> Result<Vec<ScreeningRecord>, Self::Error> {
        let conn = self.conn()?;
        Self::query_screenings(
            &conn,
            &format!(
                "SELECT {SCREENING_COLUMNS} FROM screenings ORDER BY screened_at DESC LIMIT ?1"
            ),
            params![limit as i64],
        )
    }

    fn load_patient_screenings(&self, patient_id: &str) -> Result<Vec<ScreeningRecord>, Self::Error> {
        let conn = self.conn()?;
        Self::query_screenings(
            &conn,
            &format!(
                "SELECT {SCREENING_COLUMNS} FROM screenings WHERE patient_id = ?1 \
                 ORDER BY screened_at DESC"
            ),
            params![patient_id],
        )
    }

    fn load_screenings_paginated(&self, offset: usize, limit: usize) -> Result<ScreeningPage, Self::Error> {
        let conn = self.conn()?;

        let total_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM screenings", [], |row| row.get(0))?;

        let items = Self::query_screenings(
            &conn,
            &format!(
                "SELECT {SCREENING_COLUMNS} FROM screenings ORDER BY screened_at DESC \
                 LIMIT ?1 OFFSET ?2"
            ),
            params![limit as i64, offset as i64],
        )?;

        Ok(ScreeningPage::new(items, total_count as usize, offset, limit))
    }

    fn count_screenings(&self) -> Result<usize, Self::Error> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM screenings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn save_follow_up(&self, follow_up: &FollowUp) -> Result<(), Self::Error> {
        let conn = self.conn()?;
        conn.execute(
            r"
            INSERT INTO follow_ups (id, screening_id, due_date, status, notes)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                follow_up.id,
                follow_up.screening_id,
                follow_up.due_date.format("%Y-%m-%d").to_string(),
                follow_up.status.code(),
                follow_up.notes,
            ],
        )?;

        tracing::debug!(
            "Scheduled follow-up {} for {}",
            follow_up.id,
            follow_up.due_date
        );
        Ok(())
    }

    fn load_follow_ups(&self, status: FollowUpStatus) -> Result<Vec<FollowUp>, Self::Error> {
        let conn = self.conn()?;
        Self::query_follow_ups(
            &conn,
            r"
            SELECT id, screening_id, due_date, status, notes
            FROM follow_ups
            WHERE status = ?1
            ORDER BY due_date ASC
            ",
            params![status.code()],
        )
    }

    fn load_overdue_follow_ups(&self, today: NaiveDate) -> Result<Vec<FollowUp>, Self::Error> {
        let conn = self.conn()?;
        Self::query_follow_ups(
            &conn,
            r"
            SELECT id, screening_id, due_date, status, notes
            FROM follow_ups
            WHERE status = ?1 AND due_date < ?2
            ORDER BY due_date ASC
            ",
            params![
                FollowUpStatus::Pending.code(),
                today.format("%Y-%m-%d").to_string()
            ],
        )
    }

    fn update_follow_up_status(
        &self,
        id: &str,
        status: FollowUpStatus,
        notes: &str,
    ) -> Result<bool, Self::Error> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE follow_ups SET status = ?1, notes = ?2 WHERE id = ?3",
            params![status.code(), notes, id],
        )?;
        Ok(changed > 0)
    }
}
