use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use thiserror::Error;

use crate::models::{
    attendance::{AttendanceRecord, InsertOutcome},
    roster::{Meeting, StudentId},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Worth one more attempt.
    #[error("transient ledger failure: {0}")]
    Transient(String),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Presence records, unique per (meeting, student).
#[async_trait]
pub trait AttendanceLedger: Send + Sync {
    async fn has_record(
        &self,
        meeting: &Meeting,
        student_id: &StudentId,
    ) -> Result<bool, LedgerError>;

    /// Atomic check-and-set on the (meeting, student) key.
    async fn insert_if_absent(
        &self,
        meeting: &Meeting,
        student_id: &StudentId,
        marked_at: DateTime<Utc>,
    ) -> Result<InsertOutcome, LedgerError>;

    async fn count_for_student(&self, student_id: &StudentId) -> Result<u32, LedgerError>;
}

type RecordKey = (Meeting, StudentId);

#[derive(Clone, Default)]
pub struct InMemoryLedger {
    records: Arc<DashMap<RecordKey, AttendanceRecord>>,
    per_student: Arc<DashMap<StudentId, u32>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, meeting: &Meeting, student_id: &StudentId) -> Option<AttendanceRecord> {
        self.records
            .get(&(meeting.clone(), student_id.clone()))
            .map(|record| record.clone())
    }
}

#[async_trait]
impl AttendanceLedger for InMemoryLedger {
    async fn has_record(
        &self,
        meeting: &Meeting,
        student_id: &StudentId,
    ) -> Result<bool, LedgerError> {
        Ok(self
            .records
            .contains_key(&(meeting.clone(), student_id.clone())))
    }

    async fn insert_if_absent(
        &self,
        meeting: &Meeting,
        student_id: &StudentId,
        marked_at: DateTime<Utc>,
    ) -> Result<InsertOutcome, LedgerError> {
        match self.records.entry((meeting.clone(), student_id.clone())) {
            Entry::Occupied(_) => Ok(InsertOutcome::AlreadyPresent),
            Entry::Vacant(slot) => {
                let _record = slot.insert(AttendanceRecord::new(meeting, student_id, marked_at));
                // Counted while the record shard is still held. Lock order is
                // always records shard, then per_student shard.
                *self.per_student.entry(student_id.clone()).or_insert(0) += 1;
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn count_for_student(&self, student_id: &StudentId) -> Result<u32, LedgerError> {
        Ok(self
            .per_student
            .get(student_id)
            .map(|count| *count)
            .unwrap_or(0))
    }
}
