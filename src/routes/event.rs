use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::{stream, Stream};
use tokio::sync::broadcast::error::RecvError;

use serde::Serialize;

use crate::{app::api::AppContext, middleware::auth::AuthTeacher};

#[utoipa::path(
    get,
    path = "/api/attendance/events",
    tag = "Attendance",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Live token and attendance events for the caller's sessions", content_type = "text/event-stream"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 403, description = "Caller is not a teacher")
    )
)]
pub async fn attendance_events(
    State(context): State<AppContext>,
    AuthTeacher(teacher): AuthTeacher,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = context.state.events.subscribe();
    tracing::info!("Teacher {} subscribed to attendance events", teacher.id);

    let stream = stream::unfold((receiver, teacher), |(mut rx, teacher)| async move {
        loop {
            match rx.recv().await {
                Ok(event) if event.teacher_id() == &teacher.id => {
                    if let Some(frame) = sse_event(&event) {
                        return Some((Ok(frame), (rx, teacher)));
                    }
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event stream for {} lagged by {} events", teacher.id, skipped);
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(std::time::Duration::from_secs(30))
            .text("keep-alive"),
    )
}

/// Encodes one event as an SSE frame. Events that fail to serialize are
/// logged and dropped rather than sent as empty frames.
fn sse_event<T: Serialize>(event: &T) -> Option<Event> {
    match Event::default().json_data(event) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::warn!("Dropping unserializable attendance event: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::{
        app::events::AttendanceEvent,
        models::roster::{SessionId, TeacherId},
    };

    #[test]
    fn attendance_events_become_frames() {
        let event = AttendanceEvent::TokenIssued {
            session_id: SessionId::new("s-1"),
            session_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            teacher_id: TeacherId::new("t-1"),
            expires_at: Utc::now(),
        };

        assert!(sse_event(&event).is_some());
    }

    #[test]
    fn unserializable_payload_is_skipped() {
        // JSON object keys must be strings.
        let payload = BTreeMap::from([(vec![1u8, 2], 3u8)]);

        assert!(sse_event(&payload).is_none());
    }
}
