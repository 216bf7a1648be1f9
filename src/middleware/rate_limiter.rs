use std::net::SocketAddr;

use axum::{extract::ConnectInfo, http::Request, middleware::Next, response::Response};

use crate::{error::AppError, utils::rate_limiter::RateLimiter};

pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let rate_limiter = req
        .extensions()
        .get::<RateLimiter>()
        .ok_or_else(|| AppError::Internal("rate limiter extension missing".into()))?;

    let client_key = rate_limiter.get_client_key(&addr);

    if !rate_limiter.check_rate_limit(&client_key) {
        tracing::warn!("Rate limit exceeded for {}", client_key);
        return Err(AppError::RateLimited);
    }

    Ok(next.run(req).await)
}
