use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use crate::models::roster::{Meeting, SessionId};

/// Alphanumeric characters per token. 32 draws from 62 symbols carry ~190 bits.
pub const TOKEN_LENGTH: usize = 32;

/// Opaque credential value shown inside the QR code. Only ever compared verbatim.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenValue(String);

impl TokenValue {
    pub fn generate() -> Self {
        let value = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();
        Self(value)
    }

    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix safe to write to logs.
    pub fn short(&self) -> String {
        short_token(&self.0)
    }
}

impl fmt::Debug for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenValue({}..)", self.short())
    }
}

pub fn short_token(raw: &str) -> String {
    raw.chars().take(8).collect()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttendanceToken {
    pub value: TokenValue,
    pub meeting: Meeting,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AttendanceToken {
    pub fn new(value: TokenValue, meeting: Meeting, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            value,
            meeting,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.meeting.session_id
    }

    /// Redeemable up to and including `expires_at`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}
