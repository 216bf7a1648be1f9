use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use thiserror::Error;

use crate::models::{
    roster::{Meeting, SessionId},
    token::{AttendanceToken, TokenValue},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenStoreError {
    #[error("token value is already registered")]
    DuplicateToken,
}

/// Active attendance tokens keyed by their opaque value.
///
/// Callers pass `now` explicitly so a single instant governs both the validity
/// check and whatever the caller does with the answer.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Stores the token with `expires_at = issued_at + ttl`. Never touches other tokens.
    async fn register(
        &self,
        value: TokenValue,
        meeting: Meeting,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<AttendanceToken, TokenStoreError>;

    /// The meeting the token was minted for, if the store still holds it.
    async fn bound_meeting(&self, value: &str) -> Option<Meeting>;

    /// True iff the token exists, is bound to `session_id`, and `now <= expires_at`.
    async fn is_valid(&self, value: &str, session_id: &SessionId, now: DateTime<Utc>) -> bool;

    /// Evicts every token expired at `now`, returning how many were dropped.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> usize;

    async fn active_count(&self) -> usize;
}

#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    tokens: Arc<DashMap<String, AttendanceToken>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn register(
        &self,
        value: TokenValue,
        meeting: Meeting,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<AttendanceToken, TokenStoreError> {
        match self.tokens.entry(value.as_str().to_owned()) {
            Entry::Occupied(_) => Err(TokenStoreError::DuplicateToken),
            Entry::Vacant(slot) => {
                let token = AttendanceToken::new(value, meeting, issued_at, ttl);
                slot.insert(token.clone());
                Ok(token)
            }
        }
    }

    async fn bound_meeting(&self, value: &str) -> Option<Meeting> {
        self.tokens.get(value).map(|token| token.meeting.clone())
    }

    async fn is_valid(&self, value: &str, session_id: &SessionId, now: DateTime<Utc>) -> bool {
        let live = match self.tokens.get(value) {
            None => return false,
            Some(token) if token.session_id() != session_id => return false,
            Some(token) => token.is_live_at(now),
        };

        // The read guard is gone by now; removing while holding it would deadlock the shard.
        if !live {
            self.tokens.remove_if(value, |_, token| !token.is_live_at(now));
        }

        live
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut evicted = 0;
        self.tokens.retain(|_, token| {
            let keep = token.is_live_at(now);
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    async fn active_count(&self) -> usize {
        self.tokens.len()
    }
}
