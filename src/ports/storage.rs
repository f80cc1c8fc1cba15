//! Storage port: Trait for persisting screenings and follow-ups.
//!
//! This trait abstracts the storage backend (SQLite) from the application logic.

use chrono::NaiveDate;

use crate::domain::{FollowUp, FollowUpStatus, ScreeningRecord};

/// A page of screening records with pagination metadata.
#[derive(Debug, Clone)]
pub struct ScreeningPage {
    pub items: Vec<ScreeningRecord>,
    /// Total count of all screenings
    pub total_count: usize,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

impl ScreeningPage {
    #[must_use]
    pub fn new(items: Vec<ScreeningRecord>, total_count: usize, offset: usize, limit: usize) -> Self {
        let has_more = offset + items.len() < total_count;
        Self {
            items,
            total_count,
            offset,
            limit,
            has_more,
        }
    }

    /// Get the next page offset.
    #[must_use]
    pub fn next_offset(&self) -> Option<usize> {
        if self.has_more {
            Some(self.offset + self.limit)
        } else {
            None
        }
    }
}

/// Trait for screening persistence.
pub trait ScreeningStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a screening record.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn save_screening(&self, record: &ScreeningRecord) -> Result<(), Self::Error>;

    /// Load a screening by ID.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_screening(&self, id: &str) -> Result<Option<ScreeningRecord>, Self::Error>;

    /// Load the most recent screenings (up to `limit`), newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_recent_screenings(&self, limit: usize) -> Result<Vec<ScreeningRecord>, Self::Error>;

    /// Load all screenings for one patient, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_patient_screenings(&self, patient_id: &str) -> Result<Vec<ScreeningRecord>, Self::Error>;

    /// Load screenings with offset pagination.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_screenings_paginated(&self, offset: usize, limit: usize) -> Result<ScreeningPage, Self::Error>;

    /// Get the total count of screenings.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_screenings(&self) -> Result<usize, Self::Error>;

    /// Save a follow-up task.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn save_follow_up(&self, follow_up: &FollowUp) -> Result<(), Self::Error>;

    /// Load follow-ups with the given status, earliest due first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_follow_ups(&self, status: FollowUpStatus) -> Result<Vec<FollowUp>, Self::Error>;

    /// Load pending follow-ups due strictly before `today`.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_overdue_follow_ups(&self, today: NaiveDate) -> Result<Vec<FollowUp>, Self::Error>;

    /// Update a follow-up's status and notes.
    ///
    /// # Returns
    /// `false` if no follow-up has this ID.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn update_follow_up_status(
        &self,
        id: &str,
        status: FollowUpStatus,
        notes: &str,
    ) -> Result<bool, Self::Error>;
}
