use std::sync::Arc;

use chrono::Duration;
use thiserror::Error;

use crate::{
    app::events::{AttendanceEvent, EventBroadcaster},
    managers::{Directory, DirectoryError, TokenStore, TokenStoreError},
    models::{
        identity::TeacherIdentity,
        roster::SessionId,
        token::{AttendanceToken, TokenValue},
    },
    utils::clock::Clock,
};

/// Fresh values drawn before giving up on a string of collisions.
const MAX_ISSUE_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("only the session's teacher can open attendance")]
    Forbidden,

    #[error("session {0} is not scheduled today")]
    UnknownSession(SessionId),

    #[error("could not allocate a unique token")]
    Exhausted,

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

pub struct TokenIssuer {
    directory: Arc<dyn Directory>,
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    events: EventBroadcaster,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(
        directory: Arc<dyn Directory>,
        store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
        events: EventBroadcaster,
        ttl: Duration,
    ) -> Self {
        Self {
            directory,
            store,
            clock,
            events,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mints a token for today's meeting of `session_id`. Earlier tokens for
    /// the meeting stay redeemable until their own expiry.
    pub async fn issue(
        &self,
        session_id: &SessionId,
        requester: &TeacherIdentity,
    ) -> Result<AttendanceToken, IssueError> {
        let now = self.clock.now();

        let session = self
            .directory
            .active_session(session_id, now)
            .await?
            .ok_or_else(|| IssueError::UnknownSession(session_id.clone()))?;

        if session.teacher_id != requester.id {
            tracing::warn!(
                "Teacher {} tried to open attendance for session {} owned by {}",
                requester.id,
                session_id,
                session.teacher_id
            );
            return Err(IssueError::Forbidden);
        }

        let meeting = session
            .meeting_on(self.directory.local_date(now))
            .ok_or_else(|| IssueError::UnknownSession(session_id.clone()))?;

        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            match self
                .store
                .register(TokenValue::generate(), meeting.clone(), now, self.ttl)
                .await
            {
                Ok(token) => {
                    tracing::info!(
                        "Issued token {} for meeting {} (expires {})",
                        token.value.short(),
                        meeting,
                        token.expires_at
                    );
                    self.events.broadcast(AttendanceEvent::TokenIssued {
                        session_id: session_id.clone(),
                        session_date: meeting.date,
                        teacher_id: session.teacher_id.clone(),
                        expires_at: token.expires_at,
                    });
                    return Ok(token);
                }
                Err(TokenStoreError::DuplicateToken) => {
                    tracing::warn!("Token collision on attempt {}, drawing again", attempt);
                }
            }
        }

        Err(IssueError::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::{
        managers::{InMemoryDirectory, InMemoryTokenStore},
        models::roster::{Meeting, TeacherId},
        utils::clock::ManualClock,
    };

    const ROSTER: &str = r#"{
        "teachers": [
            { "id": "t-1", "full_name": "Ada Byron", "employee_id": "E-1", "email": "ada@school.test" },
            { "id": "t-2", "full_name": "Grace Hopper", "employee_id": "E-2", "email": "grace@school.test" }
        ],
        "courses": [ { "id": "c-1", "course_name": "Compilers" } ],
        "schedules": [
            { "id": "s-mon", "course_id": "c-1", "teacher_id": "t-1", "day_of_week": 1, "start_time": "09:00:00", "end_time": "10:00:00" },
            { "id": "s-tue", "course_id": "c-1", "teacher_id": "t-1", "day_of_week": 2, "start_time": "09:00:00", "end_time": "10:00:00" }
        ]
    }"#;

    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn issuer_with(store: Arc<dyn TokenStore>, clock: ManualClock) -> TokenIssuer {
        let directory =
            InMemoryDirectory::from_json(ROSTER, chrono::FixedOffset::east_opt(0).unwrap()).unwrap();
        TokenIssuer::new(
            Arc::new(directory),
            store,
            Arc::new(clock),
            EventBroadcaster::new(),
            Duration::seconds(30),
        )
    }

    fn teacher(id: &str) -> TeacherIdentity {
        TeacherIdentity { id: TeacherId::new(id) }
    }

    #[tokio::test]
    async fn issues_for_the_owning_teacher() {
        let store = Arc::new(InMemoryTokenStore::new());
        let issuer = issuer_with(store.clone(), ManualClock::new(monday()));

        let token = issuer.issue(&SessionId::new("s-mon"), &teacher("t-1")).await.unwrap();

        assert_eq!(token.expires_at - token.issued_at, Duration::seconds(30));
        assert!(store.is_valid(token.value.as_str(), &SessionId::new("s-mon"), monday()).await);
    }

    #[tokio::test]
    async fn other_teachers_are_forbidden() {
        let issuer = issuer_with(Arc::new(InMemoryTokenStore::new()), ManualClock::new(monday()));

        let err = issuer.issue(&SessionId::new("s-mon"), &teacher("t-2")).await.unwrap_err();
        assert!(matches!(err, IssueError::Forbidden));
    }

    #[tokio::test]
    async fn sessions_not_on_today_are_unknown() {
        let issuer = issuer_with(Arc::new(InMemoryTokenStore::new()), ManualClock::new(monday()));

        let other_day = issuer.issue(&SessionId::new("s-tue"), &teacher("t-1")).await.unwrap_err();
        let missing = issuer.issue(&SessionId::new("nope"), &teacher("t-1")).await.unwrap_err();

        assert!(matches!(other_day, IssueError::UnknownSession(_)));
        assert!(matches!(missing, IssueError::UnknownSession(_)));
    }

    #[tokio::test]
    async fn reissuing_keeps_the_earlier_token_valid() {
        let store = Arc::new(InMemoryTokenStore::new());
        let clock = ManualClock::new(monday());
        let issuer = issuer_with(store.clone(), clock.clone());
        let session = SessionId::new("s-mon");

        let first = issuer.issue(&session, &teacher("t-1")).await.unwrap();
        clock.advance(Duration::seconds(10));
        let second = issuer.issue(&session, &teacher("t-1")).await.unwrap();
        clock.advance(Duration::seconds(10));

        assert_ne!(first.value, second.value);
        assert!(store.is_valid(first.value.as_str(), &session, clock.now()).await);
        assert!(store.is_valid(second.value.as_str(), &session, clock.now()).await);
    }

    #[tokio::test]
    async fn announces_issued_tokens() {
        let events = EventBroadcaster::new();
        let mut rx = events.subscribe();
        let directory =
            InMemoryDirectory::from_json(ROSTER, chrono::FixedOffset::east_opt(0).unwrap()).unwrap();
        let issuer = TokenIssuer::new(
            Arc::new(directory),
            Arc::new(InMemoryTokenStore::new()),
            Arc::new(ManualClock::new(monday())),
            events,
            Duration::seconds(30),
        );

        let token = issuer.issue(&SessionId::new("s-mon"), &teacher("t-1")).await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            AttendanceEvent::TokenIssued {
                session_id: SessionId::new("s-mon"),
                session_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                teacher_id: TeacherId::new("t-1"),
                expires_at: token.expires_at,
            }
        );
    }

    #[tokio::test]
    async fn tokens_bind_to_the_dated_meeting() {
        let store = Arc::new(InMemoryTokenStore::new());
        let clock = ManualClock::new(monday());
        let issuer = issuer_with(store.clone(), clock.clone());
        let session = SessionId::new("s-mon");

        let this_week = issuer.issue(&session, &teacher("t-1")).await.unwrap();
        clock.advance(Duration::days(7));
        let next_week = issuer.issue(&session, &teacher("t-1")).await.unwrap();

        assert_eq!(this_week.meeting.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(next_week.meeting.date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert_eq!(
            store.bound_meeting(next_week.value.as_str()).await,
            Some(next_week.meeting.clone())
        );
    }

    struct AlwaysColliding;

    #[async_trait]
    impl TokenStore for AlwaysColliding {
        async fn register(
            &self,
            _value: TokenValue,
            _meeting: Meeting,
            _issued_at: DateTime<Utc>,
            _ttl: Duration,
        ) -> Result<AttendanceToken, TokenStoreError> {
            Err(TokenStoreError::DuplicateToken)
        }

        async fn bound_meeting(&self, _value: &str) -> Option<Meeting> {
            None
        }

        async fn is_valid(&self, _value: &str, _session_id: &SessionId, _now: DateTime<Utc>) -> bool {
            false
        }

        async fn sweep_expired(&self, _now: DateTime<Utc>) -> usize {
            0
        }

        async fn active_count(&self) -> usize {
            0
        }
    }

    #[tokio::test]
    async fn gives_up_after_repeated_collisions() {
        let issuer = issuer_with(Arc::new(AlwaysColliding), ManualClock::new(monday()));

        let err = issuer.issue(&SessionId::new("s-mon"), &teacher("t-1")).await.unwrap_err();
        assert!(matches!(err, IssueError::Exhausted));
    }
}
