use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use qr_attendance::{
    app::{
        api::{create_api_router, AppContext},
        reaper::TokenReaper,
        state::AppState,
    },
    config::GlobalConfig,
    managers::InMemoryDirectory,
    services::identity::JwtIdentityProvider,
    utils::{clock::SystemClock, rate_limiter::RateLimiter},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting QR attendance service");

    let config = GlobalConfig::from_env()?;

    let directory = InMemoryDirectory::load(
        &config.directory.roster_path,
        config.directory.utc_offset()?,
    )
    .with_context(|| format!("Failed to load roster from {}", config.directory.roster_path))?;

    let clock = Arc::new(SystemClock);
    let state = AppState::new(
        Arc::new(directory),
        Arc::new(JwtIdentityProvider::new(&config.auth.jwt_secret)),
        clock.clone(),
        chrono::Duration::seconds(config.attendance.token_ttl_secs),
    );

    let reaper = TokenReaper::spawn(
        state.token_store.clone(),
        clock,
        Duration::from_secs(config.attendance.token_sweep_interval_secs),
    );

    let rate_limiter = RateLimiter::new(config.server.rate_limit_rps);
    let limiter_state = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));

        loop {
            interval.tick().await;
            let purged = limiter_state.purge_idle();
            if purged > 0 {
                tracing::debug!("Purged {} idle rate-limit windows", purged);
            }
        }
    });

    let context = AppContext {
        state,
        config: config.clone(),
        rate_limiter,
    };

    let app: Router = create_api_router(context)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!("QR attendance service running on http://{}", addr);
    tracing::info!("Token TTL: {}s", config.attendance.token_ttl_secs);
    tracing::info!(
        "Low-attendance threshold: {}",
        config.attendance.low_attendance_threshold
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    reaper.stop().await;
    tracing::info!("Shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
