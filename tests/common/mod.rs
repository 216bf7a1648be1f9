#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::connect_info::MockConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use qr_attendance::{
    app::{
        api::{create_api_router, AppContext},
        state::AppState,
    },
    config::{AttendanceConfig, AuthConfig, DirectoryConfig, GlobalConfig, ServerConfig},
    managers::InMemoryDirectory,
    models::identity::Role,
    services::identity::JwtIdentityProvider,
    utils::{clock::ManualClock, rate_limiter::RateLimiter},
};

pub const SECRET: &str = "integration-secret";

/// 2024-01-01 was a Monday; every fixture session except `s-tue` runs then.
pub fn monday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

pub fn config() -> GlobalConfig {
    GlobalConfig {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors_allowed_origins: vec!["http://localhost:5173".into()],
            rate_limit_rps: 1000,
        },
        attendance: AttendanceConfig {
            token_ttl_secs: 30,
            token_sweep_interval_secs: 60,
            low_attendance_threshold: 5,
        },
        auth: AuthConfig {
            jwt_secret: SECRET.into(),
        },
        directory: DirectoryConfig {
            roster_path: concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/roster.json").into(),
            utc_offset_minutes: 0,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: ManualClock,
    identity: Arc<JwtIdentityProvider>,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn message(&self) -> String {
        self.json()["message"].as_str().unwrap_or_default().to_string()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_rate_limiter(RateLimiter::new(1000))
    }

    pub fn with_rate_limiter(rate_limiter: RateLimiter) -> Self {
        let config = config();
        let directory = InMemoryDirectory::load(
            &config.directory.roster_path,
            FixedOffset::east_opt(0).unwrap(),
        )
        .expect("fixture roster loads");
        let identity = Arc::new(JwtIdentityProvider::new(SECRET));
        let clock = ManualClock::new(monday_morning());

        let state = AppState::new(
            Arc::new(directory),
            identity.clone(),
            Arc::new(clock.clone()),
            Duration::seconds(config.attendance.token_ttl_secs),
        );

        let context = AppContext {
            state: state.clone(),
            config,
            rate_limiter,
        };
        let router = create_api_router(context)
            .expect("router builds")
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

        Self {
            router,
            state,
            clock,
            identity,
        }
    }

    pub fn teacher(&self, id: &str) -> String {
        self.identity
            .mint(id, Role::Teacher, Duration::hours(1))
            .expect("credential signs")
    }

    pub fn student(&self, id: &str) -> String {
        self.identity
            .mint(id, Role::Student, Duration::hours(1))
            .expect("credential signs")
    }

    pub async fn send(&self, request: Request<Body>) -> Reply {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        Reply {
            status,
            headers,
            body,
        }
    }

    pub async fn post(&self, path: &str, credential: Option<&str>, body: Value) -> Reply {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(credential) = credential {
            request = request.header(header::AUTHORIZATION, format!("Bearer {credential}"));
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn get(&self, path: &str, credential: Option<&str>) -> Reply {
        let mut request = Request::builder().method(Method::GET).uri(path);
        if let Some(credential) = credential {
            request = request.header(header::AUTHORIZATION, format!("Bearer {credential}"));
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    /// Opens attendance the way the teacher's dashboard does and returns the
    /// raw token the QR code carries.
    pub async fn open_session(&self, session: &str, teacher: &str) -> String {
        use qr_attendance::models::{identity::TeacherIdentity, roster::{SessionId, TeacherId}};

        let token = self
            .state
            .issuer
            .issue(
                &SessionId::new(session),
                &TeacherIdentity {
                    id: TeacherId::new(teacher),
                },
            )
            .await
            .expect("session opens");
        token.value.as_str().to_owned()
    }

    pub async fn mark(&self, token: &str, student: &str) -> Reply {
        let credential = self.student(student);
        self.post(
            "/api/attendance/mark",
            Some(&credential),
            serde_json::json!({ "token": token }),
        )
        .await
    }
}
