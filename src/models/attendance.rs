use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::roster::{Meeting, SessionId, StudentId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub session_id: SessionId,
    pub session_date: NaiveDate,
    pub student_id: StudentId,
    pub marked_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn new(meeting: &Meeting, student_id: &StudentId, marked_at: DateTime<Utc>) -> Self {
        Self {
            session_id: meeting.session_id.clone(),
            session_date: meeting.date,
            student_id: student_id.clone(),
            marked_at,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}

/// Successful results of a redemption. Rejections are `RedemptionError`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RedemptionOutcome {
    Marked(AttendanceRecord),
    AlreadyMarked { meeting: Meeting },
}

impl RedemptionOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Marked(_) => "Attendance marked successfully!",
            Self::AlreadyMarked { .. } => "Attendance already marked for this class.",
        }
    }

    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Marked(record) => &record.session_id,
            Self::AlreadyMarked { meeting } => &meeting.session_id,
        }
    }

    pub fn session_date(&self) -> NaiveDate {
        match self {
            Self::Marked(record) => record.session_date,
            Self::AlreadyMarked { meeting } => meeting.date,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LowAttendanceEntry {
    pub student_id: StudentId,
    pub full_name: String,
    pub roll_number: String,
    pub attendance_count: u32,
}
