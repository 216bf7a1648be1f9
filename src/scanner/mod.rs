//! Student-side capture loop.
//!
//! A scan opens the camera, submits the first decoded payload exactly once,
//! and releases the camera on every way out: success, failure, `stop()`, or
//! the handle being dropped.

pub mod http;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};

pub use http::HttpRedeemer;

#[derive(Debug, Error)]
pub enum ScannerError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    /// The server's human-readable refusal.
    #[error("{0}")]
    Rejected(String),

    #[error("could not reach the attendance service")]
    Transport(#[from] reqwest::Error),
}

/// Frame source that yields decoded QR payloads.
#[async_trait]
pub trait Camera: Send + 'static {
    async fn open(&mut self) -> Result<(), ScannerError>;

    /// Next decoded payload; `None` once the stream has ended.
    async fn next_decode(&mut self) -> Option<String>;

    fn release(&mut self);
}

/// Submits a scanned token and returns the message to show the student.
#[async_trait]
pub trait Redeemer: Send + Sync + 'static {
    async fn redeem(&self, token: &str) -> Result<String, ScannerError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    Redeemed(String),
    Cancelled,
    Failed(String),
}

impl ScanOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Redeemed(message) | Self::Failed(message) => message,
            Self::Cancelled => "Scan cancelled.",
        }
    }
}

/// Owns the camera for one scan and releases it exactly once.
struct CameraLease<C: Camera> {
    camera: C,
    released: bool,
}

impl<C: Camera> CameraLease<C> {
    fn new(camera: C) -> Self {
        Self {
            camera,
            released: false,
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.camera.release();
        }
    }
}

impl<C: Camera> Drop for CameraLease<C> {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct Scanner;

impl Scanner {
    pub fn start<C, R>(camera: C, redeemer: Arc<R>) -> ScanHandle
    where
        C: Camera,
        R: Redeemer + ?Sized,
    {
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut lease = CameraLease::new(camera);
            let outcome = scan(&mut lease, redeemer.as_ref(), stop_rx).await;
            lease.release();
            outcome
        });

        ScanHandle {
            stop_tx,
            stopping: AtomicBool::new(false),
            task,
        }
    }
}

async fn scan<C, R>(
    lease: &mut CameraLease<C>,
    redeemer: &R,
    mut stop_rx: watch::Receiver<bool>,
) -> ScanOutcome
where
    C: Camera,
    R: Redeemer + ?Sized,
{
    tokio::select! {
        biased;
        _ = stop_rx.wait_for(|stopped| *stopped) => return ScanOutcome::Cancelled,
        opened = lease.camera.open() => {
            if let Err(e) = opened {
                tracing::warn!("Camera failed to open: {}", e);
                return ScanOutcome::Failed(e.to_string());
            }
        }
    }

    loop {
        let decoded = tokio::select! {
            biased;
            _ = stop_rx.wait_for(|stopped| *stopped) => return ScanOutcome::Cancelled,
            frame = lease.camera.next_decode() => frame,
        };

        let Some(payload) = decoded else {
            return ScanOutcome::Failed("Camera stopped before a code was scanned.".to_string());
        };

        let payload = payload.trim();
        if payload.is_empty() {
            continue;
        }

        // First decode wins. The camera is not polled again, so repeated
        // frames of the same code never reach the server.
        return match redeemer.redeem(payload).await {
            Ok(message) => ScanOutcome::Redeemed(message),
            Err(e) => ScanOutcome::Failed(e.to_string()),
        };
    }
}

/// Running scan. Dropping the handle stops it.
pub struct ScanHandle {
    stop_tx: watch::Sender<bool>,
    stopping: AtomicBool,
    task: JoinHandle<ScanOutcome>,
}

impl ScanHandle {
    /// Idempotent.
    pub fn stop(&self) {
        if !self.stopping.swap(true, Ordering::SeqCst) {
            tracing::debug!("Stopping scanner");
        }
        self.stop_tx.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn outcome(mut self) -> ScanOutcome {
        match (&mut self.task).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Scanner task failed: {}", e);
                ScanOutcome::Failed("Scanner stopped unexpectedly.".to_string())
            }
        }
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
