//! Session orchestration: one observer, one position stream, one loop.
//!
//! [`GuardianSession`] wires the provider watch into the geofence engine,
//! behavior monitor and risk scorer, schedules catalog reloads, and owns
//! cancellation. All engine/monitor mutation happens on a single consumer
//! task, processing position events strictly in arrival order; the catalog
//! snapshot is the only state shared with the reload task.

mod pipeline;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use tourguard_behavior::BehaviorConfig;
use tourguard_engine::RiskSnapshot;
use tourguard_events::{durations, AlertSeverity, AlertSinkRef, IncidentSinkRef, Notification};
use tourguard_geo::{
    GeoError, PermissionProviderRef, PositionProviderRef, WatchHandle, WatchOptions,
    WATCH_CHANNEL_CAPACITY,
};
use tourguard_zones::{Zone, ZoneCatalog, ZoneRepositoryRef};

pub use pipeline::DEFAULT_RELOAD_INTERVAL;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error(transparent)]
    Geo(#[from] GeoError),
}

/// Session-scoped configuration.
///
/// Replaces the original design's process-wide flags: everything that used
/// to live in ad hoc global storage (guard-mode enablement, last known zone)
/// is an explicit field here or on the engine, initialized when the session
/// starts and dropped when it ends.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Owner scope for declared-zone fetches.
    pub owner_id: String,
    pub watch: WatchOptions,
    pub behavior: BehaviorConfig,
    /// How often the zone catalog is refreshed from the remote store.
    pub catalog_reload_interval: Duration,
    /// Whether the behavior monitor raises automatic emergency triggers.
    /// Defaults to enabled.
    pub auto_guard: bool,
}

impl SessionConfig {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            watch: WatchOptions::default(),
            behavior: BehaviorConfig::default(),
            catalog_reload_interval: DEFAULT_RELOAD_INTERVAL,
            auto_guard: true,
        }
    }
}

/// A running geofencing session.
///
/// Holds the watch handle and the cancellation token for both background
/// tasks (position consumer, catalog reloader). Stopping is idempotent;
/// dropping the session stops it too.
pub struct GuardianSession {
    cancel: CancellationToken,
    watch_handle: WatchHandle,
    catalog: Arc<ZoneCatalog>,
    risk_rx: watch::Receiver<RiskSnapshot>,
    tasks: Vec<JoinHandle<()>>,
}

impl GuardianSession {
    /// Negotiate permission, start the catalog reloader and the position
    /// watch, and begin processing.
    ///
    /// Permission denial is terminal: geofencing simply does not start, and
    /// an actionable notification tells the user how to fix it.
    pub async fn start(
        config: SessionConfig,
        permissions: PermissionProviderRef,
        positions: PositionProviderRef,
        repository: ZoneRepositoryRef,
        alerts: AlertSinkRef,
        incidents: IncidentSinkRef,
    ) -> Result<Self, SessionError> {
        if !permissions.request_permission().await {
            alerts.notify(Notification {
                severity: AlertSeverity::Danger,
                message: "Location access denied. Please enable permissions in your settings."
                    .into(),
                duration: durations::DANGER,
            });
            return Err(SessionError::PermissionDenied);
        }

        let cancel = CancellationToken::new();
        let catalog = Arc::new(ZoneCatalog::new(repository, config.owner_id.clone()));

        // Signals the consumer once the first reload lands, so a buffered
        // pre-catalog position can be replayed immediately.
        let (loaded_tx, loaded_rx) = watch::channel(false);
        let reloader = tokio::spawn(pipeline::reload_loop(
            Arc::clone(&catalog),
            config.catalog_reload_interval,
            cancel.clone(),
            loaded_tx,
        ));

        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        let watch_handle = positions.watch(&config.watch, tx).await?;

        let (risk_tx, risk_rx) = watch::channel(RiskSnapshot::default());
        let consumer = tokio::spawn(pipeline::event_loop(pipeline::EventLoop {
            rx,
            loaded_rx,
            catalog: Arc::clone(&catalog),
            alerts,
            incidents,
            risk_tx,
            cancel: cancel.clone(),
            behavior: config.behavior,
            auto_guard: config.auto_guard,
        }));

        tracing::info!(owner = %config.owner_id, "guardian session started");
        Ok(Self {
            cancel,
            watch_handle,
            catalog,
            risk_rx,
            tasks: vec![reloader, consumer],
        })
    }

    /// Latest derived risk snapshot.
    pub fn risk(&self) -> RiskSnapshot {
        self.risk_rx.borrow().clone()
    }

    /// Latest complete zone snapshot, for map display.
    pub fn zones(&self) -> Arc<Vec<Zone>> {
        self.catalog.current()
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the watch and cease reload scheduling. Idempotent; in-flight
    /// reload results are discarded along with their task.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("guardian session stopped");
        }
        self.cancel.cancel();
        self.watch_handle.cancel();
    }

    /// Stop and wait for both background tasks to wind down.
    pub async fn shutdown(mut self) {
        self.stop();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
    }
}

impl Drop for GuardianSession {
    fn drop(&mut self) {
        self.stop();
    }
}
