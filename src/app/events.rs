use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{channel, Receiver, Sender};

use crate::models::roster::{SessionId, StudentId, TeacherId};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum AttendanceEvent {
    TokenIssued {
        session_id: SessionId,
        session_date: NaiveDate,
        teacher_id: TeacherId,
        expires_at: DateTime<Utc>,
    },
    AttendanceMarked {
        session_id: SessionId,
        session_date: NaiveDate,
        teacher_id: TeacherId,
        student_id: StudentId,
        marked_at: DateTime<Utc>,
    },
}

impl AttendanceEvent {
    pub fn teacher_id(&self) -> &TeacherId {
        match self {
            Self::TokenIssued { teacher_id, .. } | Self::AttendanceMarked { teacher_id, .. } => {
                teacher_id
            }
        }
    }
}

#[derive(Clone)]
pub struct EventBroadcaster {
    sender: Sender<AttendanceEvent>,
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = channel(1024);
        Self { sender }
    }

    pub fn broadcast(&self, event: AttendanceEvent) {
        // No subscribers is the normal case outside an open teacher dashboard.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> Receiver<AttendanceEvent> {
        self.sender.subscribe()
    }
}
