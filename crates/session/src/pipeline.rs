//! Background tasks: catalog reloader and the single-consumer event loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use tourguard_behavior::{BehaviorConfig, BehaviorMonitor};
use tourguard_engine::{GeofenceEngine, RiskScorer, RiskSnapshot, DANGER_VIBRATION_PATTERN};
use tourguard_events::{
    durations, AlertSeverity, AlertSinkRef, DeviceInfo, EmergencyRecord, IncidentSinkRef,
    Notification, SyntheticTrigger,
};
use tourguard_geo::{Position, WatchEvent};
use tourguard_zones::ZoneCatalog;

/// Production default between catalog refreshes.
pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically rebuild the catalog snapshot. The first tick fires
/// immediately; `loaded_tx` flips to true after the first completed reload.
pub(crate) async fn reload_loop(
    catalog: Arc<ZoneCatalog>,
    interval: Duration,
    cancel: CancellationToken,
    loaded_tx: watch::Sender<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                // Cancellation mid-reload drops this future, discarding the
                // in-flight result.
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = catalog.reload() => {
                        let _ = loaded_tx.send(true);
                    }
                }
            }
        }
    }
    tracing::debug!("catalog reloader stopped");
}

pub(crate) struct EventLoop {
    pub rx: mpsc::Receiver<WatchEvent>,
    pub loaded_rx: watch::Receiver<bool>,
    pub catalog: Arc<ZoneCatalog>,
    pub alerts: AlertSinkRef,
    pub incidents: IncidentSinkRef,
    pub risk_tx: watch::Sender<RiskSnapshot>,
    pub cancel: CancellationToken,
    pub behavior: BehaviorConfig,
    pub auto_guard: bool,
}

/// Single consumer of the position stream.
///
/// Events are processed strictly in arrival order, each to completion before
/// the next; engine and monitor state are owned here and never shared. A fix
/// arriving before the first catalog load is buffered (most recent wins) and
/// replayed exactly once when the load lands.
pub(crate) async fn event_loop(ctx: EventLoop) {
    let EventLoop {
        mut rx,
        mut loaded_rx,
        catalog,
        alerts,
        incidents,
        risk_tx,
        cancel,
        behavior,
        auto_guard,
    } = ctx;

    let mut engine = GeofenceEngine::new();
    let mut monitor = BehaviorMonitor::new(behavior);
    let mut pending: Option<Position> = None;
    let mut awaiting_first_load = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = loaded_rx.changed(), if awaiting_first_load => {
                awaiting_first_load = false;
                if changed.is_err() {
                    continue;
                }
                if let Some(position) = pending.take() {
                    tracing::debug!("replaying buffered pre-catalog position");
                    process_fix(
                        &position, &catalog, &mut engine, &mut monitor,
                        &alerts, &incidents, &risk_tx, auto_guard,
                    )
                    .await;
                }
            }
            event = rx.recv() => {
                let Some(event) = event else { break };
                match event {
                    WatchEvent::Error(error) => {
                        // Transient by contract: log and keep consuming.
                        tracing::warn!(%error, "position watch error");
                    }
                    WatchEvent::Fix(position) => {
                        if !catalog.is_loaded() {
                            pending = Some(position);
                            continue;
                        }
                        if let Some(buffered) = pending.take() {
                            process_fix(
                                &buffered, &catalog, &mut engine, &mut monitor,
                                &alerts, &incidents, &risk_tx, auto_guard,
                            )
                            .await;
                        }
                        process_fix(
                            &position, &catalog, &mut engine, &mut monitor,
                            &alerts, &incidents, &risk_tx, auto_guard,
                        )
                        .await;
                    }
                }
            }
        }
    }

    engine.reset();
    monitor.reset();
    tracing::debug!("position consumer stopped");
}

#[allow(clippy::too_many_arguments)]
async fn process_fix(
    position: &Position,
    catalog: &ZoneCatalog,
    engine: &mut GeofenceEngine,
    monitor: &mut BehaviorMonitor,
    alerts: &AlertSinkRef,
    incidents: &IncidentSinkRef,
    risk_tx: &watch::Sender<RiskSnapshot>,
    auto_guard: bool,
) {
    let zones = catalog.current();
    let outcome = engine.check(position, &zones);

    if let Some(alert) = &outcome.displayed {
        if alert.haptic {
            alerts.vibrate(&DANGER_VIBRATION_PATTERN);
        }
        alerts.notify(Notification {
            severity: alert.severity,
            message: alert.message.clone(),
            duration: duration_for(alert.severity),
        });
    }

    if let Some(notice) = &outcome.transition {
        alerts.notify(Notification {
            severity: notice.severity,
            message: notice.message.clone(),
            duration: duration_for(notice.severity),
        });
    }

    risk_tx.send_replace(RiskScorer::score(position, &zones));

    if auto_guard {
        for trigger in monitor.observe(position, outcome.classification, position.timestamp) {
            dispatch_trigger(trigger, alerts, incidents).await;
        }
    }
}

/// Best-effort trigger dispatch: record creation failure is logged and
/// surfaced as a non-fatal notification, never propagated into the loop.
async fn dispatch_trigger(
    trigger: SyntheticTrigger,
    alerts: &AlertSinkRef,
    incidents: &IncidentSinkRef,
) {
    let record = EmergencyRecord {
        position: trigger.position,
        emergency_type: trigger.emergency_type.clone(),
        description: trigger.description.clone(),
        device_info: DeviceInfo {
            platform: std::env::consts::OS.to_string(),
            source: trigger.source_tag.clone(),
        },
    };

    match incidents.create_emergency_record(record).await {
        Ok(record_id) => {
            tracing::info!(?record_id, "automatic emergency record created");
            alerts.notify(Notification {
                severity: AlertSeverity::Caution,
                message: format!("AI Safety Trigger: {}", trigger.description),
                duration: durations::TRIGGER,
            });
        }
        Err(error) => {
            tracing::warn!(%error, "automatic emergency record failed");
            alerts.notify(Notification {
                severity: AlertSeverity::Caution,
                message: "Automatic SOS could not be submitted. Please check your connection."
                    .into(),
                duration: durations::INFO,
            });
        }
    }
}

fn duration_for(severity: AlertSeverity) -> Duration {
    match severity {
        AlertSeverity::Danger => durations::DANGER,
        AlertSeverity::Caution => durations::CAUTION,
        AlertSeverity::Info | AlertSeverity::Success => durations::INFO,
    }
}
