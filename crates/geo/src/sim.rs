//! Scripted provider for tests and headless demos.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    GeoError, PermissionProvider, Position, PositionProvider, Result, WatchEvent, WatchHandle,
    WatchOptions,
};

/// Position provider driven by a pre-loaded script of events.
///
/// Models the native permission contract: the first `request_permission`
/// shows "the dialog" (observable via [`SimulatedProvider::dialog_count`]),
/// later calls answer from the cached grant.
pub struct SimulatedProvider {
    grant: bool,
    dialog_count: AtomicUsize,
    asked: AtomicBool,
    script: Arc<Mutex<VecDeque<WatchEvent>>>,
    /// Pause between delivered events, so tests can interleave with other work.
    pace: Duration,
}

impl SimulatedProvider {
    pub fn granting() -> Self {
        Self::new(true)
    }

    pub fn denying() -> Self {
        Self::new(false)
    }

    fn new(grant: bool) -> Self {
        Self {
            grant,
            dialog_count: AtomicUsize::new(0),
            asked: AtomicBool::new(false),
            script: Arc::new(Mutex::new(VecDeque::new())),
            pace: Duration::from_millis(1),
        }
    }

    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Queue a fix for delivery.
    pub fn push_fix(&self, position: Position) {
        self.script
            .lock()
            .expect("script mutex poisoned")
            .push_back(WatchEvent::Fix(position));
    }

    /// Queue a transient error for delivery.
    pub fn push_error(&self, error: GeoError) {
        self.script
            .lock()
            .expect("script mutex poisoned")
            .push_back(WatchEvent::Error(error));
    }

    /// How many times the permission dialog was shown.
    pub fn dialog_count(&self) -> usize {
        self.dialog_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionProvider for SimulatedProvider {
    async fn request_permission(&self) -> bool {
        if !self.asked.swap(true, Ordering::SeqCst) {
            self.dialog_count.fetch_add(1, Ordering::SeqCst);
        }
        self.grant
    }
}

#[async_trait]
impl PositionProvider for SimulatedProvider {
    async fn current_position(&self, _options: &WatchOptions) -> Result<Position> {
        if !self.grant {
            return Err(GeoError::PermissionDenied);
        }
        let mut script = self.script.lock().expect("script mutex poisoned");
        match script.pop_front() {
            Some(WatchEvent::Fix(position)) => Ok(position),
            Some(WatchEvent::Error(error)) => Err(error),
            None => Err(GeoError::Unavailable("script exhausted".into())),
        }
    }

    async fn watch(
        &self,
        _options: &WatchOptions,
        tx: mpsc::Sender<WatchEvent>,
    ) -> Result<WatchHandle> {
        if !self.grant {
            return Err(GeoError::PermissionDenied);
        }

        let token = CancellationToken::new();
        let producer_token = token.clone();
        let script = Arc::clone(&self.script);
        let pace = self.pace;

        tokio::spawn(async move {
            loop {
                if producer_token.is_cancelled() {
                    break;
                }
                let next = script.lock().expect("script mutex poisoned").pop_front();
                let Some(event) = next else {
                    // Script exhausted: keep the subscription open, like a GPS
                    // waiting for the next fix, until cancelled.
                    tokio::select! {
                        _ = producer_token.cancelled() => break,
                        _ = tokio::time::sleep(pace) => continue,
                    }
                };
                if tx.send(event).await.is_err() {
                    tracing::debug!("watch receiver closed, stopping simulated producer");
                    break;
                }
                tokio::select! {
                    _ = producer_token.cancelled() => break,
                    _ = tokio::time::sleep(pace) => {}
                }
            }
        });

        Ok(WatchHandle::new(token))
    }
}
