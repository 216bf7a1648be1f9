use axum::{extract::State, Json};

use crate::{
    app::api::AppContext,
    error::AppError,
    middleware::auth::AuthIdentity,
    models::responses::ScheduleItem,
};

#[utoipa::path(
    get,
    path = "/api/schedules/my-day",
    tag = "Schedules",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Today's sessions for the caller, by start time", body = [ScheduleItem]),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn my_day(
    State(context): State<AppContext>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<Vec<ScheduleItem>>, AppError> {
    let directory = &context.state.directory;
    let today = directory.weekday_of(context.state.clock.now());
    let sessions = directory.sessions_for_day(&identity, today).await?;

    let mut items = Vec::with_capacity(sessions.len());
    for session in sessions {
        let teacher_name = directory
            .teacher(&session.teacher_id)
            .await?
            .map(|teacher| teacher.full_name)
            .unwrap_or_else(|| "N/A".to_string());

        items.push(ScheduleItem {
            schedule_id: session.id.to_string(),
            course_name: session.course_name,
            start_time: session.start_time.format("%H:%M").to_string(),
            end_time: session.end_time.format("%H:%M").to_string(),
            teacher_name,
        });
    }

    Ok(Json(items))
}
