use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle, time::interval};

use crate::{managers::TokenStore, utils::clock::Clock};

/// Background sweep of expired tokens. Lookups already refuse expired tokens;
/// this only bounds memory.
pub struct TokenReaper {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TokenReaper {
    pub fn spawn(store: Arc<dyn TokenStore>, clock: Arc<dyn Clock>, every: Duration) -> Self {
        let (shutdown, mut stop) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval(every);

            loop {
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = ticker.tick() => {
                        let evicted = store.sweep_expired(clock.now()).await;
                        if evicted > 0 {
                            tracing::debug!("Swept {} expired tokens", evicted);
                        }
                    }
                }
            }

            tracing::info!("Token reaper stopped");
        });

        Self { shutdown, task }
    }

    pub async fn stop(self) {
        self.shutdown.send_replace(true);
        if let Err(e) = self.task.await {
            tracing::warn!("Token reaper ended abnormally: {}", e);
        }
    }
}
