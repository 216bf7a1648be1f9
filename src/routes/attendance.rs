use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    app::api::AppContext,
    error::AppError,
    middleware::auth::{AuthStudent, AuthTeacher},
    models::{
        requests::{GenerateQrRequest, MarkAttendanceRequest},
        responses::ApiResponse,
    },
    services::qr::render_png,
};

pub const TOKEN_EXPIRES_AT_HEADER: &str = "x-token-expires-at";

#[utoipa::path(
    post,
    path = "/api/attendance/generate-qr",
    tag = "Attendance",
    request_body = GenerateQrRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "PNG QR code carrying a fresh attendance token", content_type = "image/png"),
        (status = 401, description = "Missing or invalid credential", body = ApiResponse),
        (status = 403, description = "Caller does not teach this session", body = ApiResponse),
        (status = 404, description = "Session unknown or not scheduled today", body = ApiResponse)
    )
)]
pub async fn generate_qr(
    State(context): State<AppContext>,
    AuthTeacher(teacher): AuthTeacher,
    Json(req): Json<GenerateQrRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = context.state.issuer.issue(&req.schedule_id, &teacher).await?;
    let png = render_png(token.value.as_str())?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
            (
                HeaderName::from_static(TOKEN_EXPIRES_AT_HEADER),
                token.expires_at.to_rfc3339(),
            ),
        ],
        png,
    ))
}

#[utoipa::path(
    post,
    path = "/api/attendance/mark",
    tag = "Attendance",
    request_body = MarkAttendanceRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Marked present, or already marked earlier", body = ApiResponse),
        (status = 400, description = "Invalid or expired QR code", body = ApiResponse),
        (status = 401, description = "Missing or invalid credential", body = ApiResponse),
        (status = 403, description = "Caller is not a student", body = ApiResponse),
        (status = 409, description = "Student not enrolled in the session's course", body = ApiResponse)
    )
)]
pub async fn mark_attendance(
    State(context): State<AppContext>,
    AuthStudent(student): AuthStudent,
    Json(req): Json<MarkAttendanceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = context.state.validator.redeem(&req.token, &student).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            outcome.message(),
            json!({
                "schedule_id": outcome.session_id(),
                "session_date": outcome.session_date(),
            }),
        )),
    ))
}
