use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    app::events::{AttendanceEvent, EventBroadcaster},
    managers::{AttendanceLedger, Directory, DirectoryError, LedgerError, TokenStore},
    models::{
        attendance::{AttendanceRecord, InsertOutcome, RedemptionOutcome},
        identity::StudentIdentity,
        roster::{Meeting, StudentId},
        token::short_token,
    },
    utils::clock::Clock,
};

#[derive(Debug, Error)]
pub enum RedemptionError {
    /// Unknown and expired tokens are deliberately indistinguishable.
    #[error("invalid or expired QR code")]
    TokenInvalid,

    #[error("you are not enrolled in this class")]
    SessionMismatch,

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("attendance could not be recorded: {0}")]
    Storage(LedgerError),
}

/// Turns a scanned token plus a student identity into at most one ledger entry.
pub struct RedemptionValidator {
    store: Arc<dyn TokenStore>,
    ledger: Arc<dyn AttendanceLedger>,
    directory: Arc<dyn Directory>,
    clock: Arc<dyn Clock>,
    events: EventBroadcaster,
}

impl RedemptionValidator {
    pub fn new(
        store: Arc<dyn TokenStore>,
        ledger: Arc<dyn AttendanceLedger>,
        directory: Arc<dyn Directory>,
        clock: Arc<dyn Clock>,
        events: EventBroadcaster,
    ) -> Self {
        Self {
            store,
            ledger,
            directory,
            clock,
            events,
        }
    }

    pub async fn redeem(
        &self,
        token: &str,
        student: &StudentIdentity,
    ) -> Result<RedemptionOutcome, RedemptionError> {
        // One instant decides validity and stamps the record, so an entry can
        // never carry a time later than the token's expiry.
        let now = self.clock.now();
        let token = token.trim();

        if token.is_empty() {
            return Err(RedemptionError::TokenInvalid);
        }

        let Some(meeting) = self.store.bound_meeting(token).await else {
            tracing::debug!("Unknown token {} from {}", short_token(token), student.id);
            return Err(RedemptionError::TokenInvalid);
        };

        if !self.store.is_valid(token, &meeting.session_id, now).await {
            tracing::debug!("Expired token {} from {}", short_token(token), student.id);
            return Err(RedemptionError::TokenInvalid);
        }

        let Some(session) = self.directory.session(&meeting.session_id).await? else {
            return Err(RedemptionError::SessionMismatch);
        };

        if !self
            .directory
            .is_enrolled(&student.id, &session.course_id)
            .await?
        {
            tracing::info!(
                "Student {} is not enrolled in {} (meeting {})",
                student.id,
                session.course_id,
                meeting
            );
            return Err(RedemptionError::SessionMismatch);
        }

        match self.insert_with_retry(&meeting, &student.id, now).await? {
            InsertOutcome::Inserted => {
                tracing::info!("Marked {} present for meeting {}", student.id, meeting);
                self.events.broadcast(AttendanceEvent::AttendanceMarked {
                    session_id: meeting.session_id.clone(),
                    session_date: meeting.date,
                    teacher_id: session.teacher_id.clone(),
                    student_id: student.id.clone(),
                    marked_at: now,
                });
                Ok(RedemptionOutcome::Marked(AttendanceRecord::new(
                    &meeting,
                    &student.id,
                    now,
                )))
            }
            InsertOutcome::AlreadyPresent => {
                tracing::debug!("{} already marked for meeting {}", student.id, meeting);
                Ok(RedemptionOutcome::AlreadyMarked { meeting })
            }
        }
    }

    async fn insert_with_retry(
        &self,
        meeting: &Meeting,
        student_id: &StudentId,
        now: DateTime<Utc>,
    ) -> Result<InsertOutcome, RedemptionError> {
        match self.ledger.insert_if_absent(meeting, student_id, now).await {
            Err(LedgerError::Transient(reason)) => {
                tracing::warn!(
                    "Transient ledger failure for ({}, {}): {}; retrying once",
                    meeting,
                    student_id,
                    reason
                );
                self.ledger
                    .insert_if_absent(meeting, student_id, now)
                    .await
                    .map_err(|e| {
                        tracing::error!("Ledger retry failed for ({}, {}): {}", meeting, student_id, e);
                        RedemptionError::Storage(e)
                    })
            }
            other => other.map_err(RedemptionError::Storage),
        }
    }
}
