use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    app::api::AppContext,
    error::AppError,
    middleware::auth::AuthTeacher,
    models::{attendance::LowAttendanceEntry, requests::LowAttendanceQuery},
};

#[utoipa::path(
    get,
    path = "/api/warnings/low-attendance",
    tag = "Warnings",
    params(LowAttendanceQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Students below the threshold, lowest count first", body = [LowAttendanceEntry]),
        (status = 401, description = "Missing or invalid credential"),
        (status = 403, description = "Caller is not a teacher")
    )
)]
pub async fn low_attendance(
    State(context): State<AppContext>,
    AuthTeacher(teacher): AuthTeacher,
    Query(query): Query<LowAttendanceQuery>,
) -> Result<Json<Vec<LowAttendanceEntry>>, AppError> {
    let threshold = query
        .threshold
        .unwrap_or(context.config.attendance.low_attendance_threshold);

    tracing::info!("Teacher {} requested students below {} marks", teacher.id, threshold);

    let entries = context.state.aggregator.students_below(threshold).await?;
    Ok(Json(entries))
}
