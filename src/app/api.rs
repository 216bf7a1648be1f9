use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    app::state::AppState,
    config::GlobalConfig,
    middleware::rate_limiter::rate_limit_middleware,
    routes::{
        attendance::{generate_qr, mark_attendance, TOKEN_EXPIRES_AT_HEADER},
        event::attendance_events,
        health::health_check,
        schedules::my_day,
        users::me,
        warnings::low_attendance,
    },
    utils::rate_limiter::RateLimiter,
};

#[derive(Clone)]
pub struct AppContext {
    pub state: AppState,
    pub config: GlobalConfig,
    pub rate_limiter: RateLimiter,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "QR Attendance API", version = "1.0.0"),
    paths(
        crate::routes::health::health_check,
        crate::routes::attendance::generate_qr,
        crate::routes::attendance::mark_attendance,
        crate::routes::event::attendance_events,
        crate::routes::warnings::low_attendance,
        crate::routes::users::me,
        crate::routes::schedules::my_day,
    ),
    components(schemas(
        crate::models::responses::ApiResponse,
        crate::models::responses::UserDetails,
        crate::models::responses::ScheduleItem,
        crate::models::attendance::LowAttendanceEntry,
        crate::models::requests::GenerateQrRequest,
        crate::models::requests::MarkAttendanceRequest,
    )),
    modifiers(&BearerAuth)
)]
struct ApiDoc;

pub fn create_api_router(context: AppContext) -> anyhow::Result<Router> {
    let origins = context
        .config
        .server
        .cors_allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| anyhow::anyhow!("Invalid CORS origin {}: {}", origin, e))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::CACHE_CONTROL])
        .expose_headers([header::HeaderName::from_static(TOKEN_EXPIRES_AT_HEADER)]);

    Ok(Router::new()
        .route("/health", get(health_check))
        .route("/api/attendance/generate-qr", post(generate_qr))
        .route("/api/attendance/mark", post(mark_attendance))
        .route("/api/attendance/events", get(attendance_events))
        .route("/api/warnings/low-attendance", get(low_attendance))
        .route("/api/users/me", get(me))
        .route("/api/schedules/my-day", get(my_day))
        .merge(SwaggerUi::new("/swagger-ui").url("/docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(rate_limit_middleware))
        .layer(axum::Extension(context.rate_limiter.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(context))
}
