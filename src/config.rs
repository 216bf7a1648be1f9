use std::env;

use anyhow::{ensure, Context};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

pub const MIN_TOKEN_TTL_SECS: i64 = 15;
pub const MAX_TOKEN_TTL_SECS: i64 = 60;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    pub server: ServerConfig,
    pub attendance: AttendanceConfig,
    pub auth: AuthConfig,
    pub directory: DirectoryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub rate_limit_rps: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AttendanceConfig {
    pub token_ttl_secs: i64,
    pub token_sweep_interval_secs: u64,
    pub low_attendance_threshold: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DirectoryConfig {
    pub roster_path: String,
    pub utc_offset_minutes: i32,
}

impl DirectoryConfig {
    pub fn utc_offset(&self) -> anyhow::Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .with_context(|| format!("invalid SCHOOL_UTC_OFFSET_MINUTES: {}", self.utc_offset_minutes))
    }
}

impl GlobalConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = GlobalConfig {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .or_else(|_| env::var("SERVER_PORT"))
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .unwrap_or(8080),
                cors_allowed_origins: env::var("CORS_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:5173".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                rate_limit_rps: env::var("RATE_LIMIT_RPS")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()
                    .unwrap_or(100),
            },
            attendance: AttendanceConfig {
                token_ttl_secs: env::var("TOKEN_TTL_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("TOKEN_TTL_SECS must be a whole number of seconds")?,
                token_sweep_interval_secs: env::var("TOKEN_SWEEP_INTERVAL_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(60),
                low_attendance_threshold: env::var("LOW_ATTENDANCE_THRESHOLD")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            auth: AuthConfig {
                jwt_secret: env::var("AUTH_JWT_SECRET")
                    .context("AUTH_JWT_SECRET must be set to the identity service's signing secret")?,
            },
            directory: DirectoryConfig {
                roster_path: env::var("ROSTER_PATH").unwrap_or_else(|_| "roster.json".to_string()),
                utc_offset_minutes: env::var("SCHOOL_UTC_OFFSET_MINUTES")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse()
                    .unwrap_or(0),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            (MIN_TOKEN_TTL_SECS..=MAX_TOKEN_TTL_SECS).contains(&self.attendance.token_ttl_secs),
            "TOKEN_TTL_SECS must be between {} and {}, got {}",
            MIN_TOKEN_TTL_SECS,
            MAX_TOKEN_TTL_SECS,
            self.attendance.token_ttl_secs
        );
        ensure!(
            self.attendance.token_sweep_interval_secs > 0,
            "TOKEN_SWEEP_INTERVAL_SECS must be positive"
        );
        ensure!(!self.auth.jwt_secret.is_empty(), "AUTH_JWT_SECRET must not be empty");
        self.directory.utc_offset()?;
        Ok(())
    }
}
