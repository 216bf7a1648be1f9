pub mod auth;
pub mod rate_limiter;
