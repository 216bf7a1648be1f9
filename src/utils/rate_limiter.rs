use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;

/// Fixed-window request counter per client IP.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<DashMap<String, RequestWindow>>,
    requests_per_window: u32,
    window_duration: Duration,
}

#[derive(Debug)]
struct RequestWindow {
    window_start: Instant,
    request_count: u32,
}

impl RateLimiter {
    pub fn new(requests_per_second: u32) -> Self {
        Self::with_window(requests_per_second.saturating_mul(60), Duration::from_secs(60))
    }

    pub fn with_window(requests_per_window: u32, window_duration: Duration) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            requests_per_window,
            window_duration,
        }
    }

    pub fn get_client_key(&self, addr: &SocketAddr) -> String {
        addr.ip().to_string()
    }

    pub fn check_rate_limit(&self, client_key: &str) -> bool {
        let now = Instant::now();

        let mut entry = self
            .windows
            .entry(client_key.to_string())
            .or_insert(RequestWindow {
                window_start: now,
                request_count: 0,
            });

        if now.duration_since(entry.window_start) >= self.window_duration {
            entry.window_start = now;
            entry.request_count = 0;
        }

        if entry.request_count >= self.requests_per_window {
            return false;
        }

        entry.request_count += 1;
        true
    }

    /// Drops windows that have already rolled over.
    pub fn purge_idle(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now.duration_since(window.window_start) < self.window_duration);
        before.saturating_sub(self.windows.len())
    }
}
