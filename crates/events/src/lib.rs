//! Shared event contracts between the geofence core and its collaborators.
//!
//! Defines the formal DTOs for alerts, transition notices and synthetic
//! emergency triggers, plus the sink traits they flow out through. Using
//! shared types here keeps every surface (notification UI, SOS record
//! creation) on the same field names.

mod sink;

pub use sink::{
    AlertSink, AlertSinkRef, IncidentSink, IncidentSinkRef, InMemoryAlertSink,
    InMemoryIncidentSink, NullAlertSink, SinkError,
};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tourguard_geo::Position;
use tourguard_zones::ZoneKind;
use uuid::Uuid;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Success,
    Caution,
    Danger,
}

/// Per-zone containment alert, at most one per continuous dwell.
///
/// Producers: geofence engine.
/// Consumers: notification UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeofenceAlert {
    pub severity: AlertSeverity,
    pub zone_id: String,
    pub zone_name: String,
    pub message: String,
    /// Whether entry should trigger device vibration, when supported.
    #[serde(default)]
    pub haptic: bool,
}

/// Informational notice emitted when the rolling classification changes.
///
/// Lower priority than [`GeofenceAlert`]: it announces the area the observer
/// is in, not a per-zone entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionNotice {
    pub severity: AlertSeverity,
    pub message: String,
    /// The new rolling classification, `None` when outside all zones.
    #[serde(default)]
    pub classification: Option<ZoneKind>,
}

/// Source tag stamped on automated triggers, so downstream consumers can
/// tell them apart from user-initiated SOS.
pub const AUTO_TRIGGER_SOURCE: &str = "auto-monitor";

/// Automatically generated emergency trigger (not user-initiated).
///
/// Producers: behavior monitor.
/// Consumers: incident sink (record creation) and notification UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticTrigger {
    /// Emergency type recorded downstream; anomaly triggers use `"other"`.
    pub emergency_type: String,
    pub description: String,
    pub position: Position,
    pub source_tag: String,
}

impl SyntheticTrigger {
    pub fn automated(description: impl Into<String>, position: Position) -> Self {
        Self {
            emergency_type: "other".into(),
            description: description.into(),
            position,
            source_tag: AUTO_TRIGGER_SOURCE.into(),
        }
    }
}

/// A notification handed to the alert sink. Fire-and-forget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub severity: AlertSeverity,
    pub message: String,
    pub duration: Duration,
}

/// Display durations for each notification class.
pub mod durations {
    use std::time::Duration;

    pub const DANGER: Duration = Duration::from_secs(5);
    pub const CAUTION: Duration = Duration::from_secs(4);
    pub const INFO: Duration = Duration::from_secs(3);
    /// Synthetic triggers stay on screen long enough to be acted on.
    pub const TRIGGER: Duration = Duration::from_secs(10);
}

/// Emergency record submitted to the incident sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyRecord {
    pub position: Position,
    pub emergency_type: String,
    pub description: String,
    pub device_info: DeviceInfo,
}

/// Minimal device fingerprint carried on emergency records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub platform: String,
    /// `"auto-monitor"` for automated triggers, distinguishing them from
    /// user-initiated SOS flows.
    pub source: String,
}

/// Identifier of a created emergency record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_automated_trigger_shape() {
        let trigger =
            SyntheticTrigger::automated("stuck", Position::at(10.0, 20.0));
        assert_eq!(trigger.emergency_type, "other");
        assert_eq!(trigger.source_tag, AUTO_TRIGGER_SOURCE);
    }

    #[test]
    fn test_alert_serde_round_trip_defaults() {
        let json = r#"{
            "severity": "danger",
            "zone_id": "z1",
            "zone_name": "Old Docks",
            "message": "You have entered Old Docks. Do not enter!"
        }"#;
        let alert: GeofenceAlert = serde_json::from_str(json).unwrap();
        assert_eq!(alert.severity, AlertSeverity::Danger);
        assert!(!alert.haptic, "haptic defaults to false");
    }

    #[test]
    fn test_transition_notice_optional_classification() {
        let json = r#"{"severity": "info", "message": "You have left all monitored zones."}"#;
        let notice: TransitionNotice = serde_json::from_str(json).unwrap();
        assert!(notice.classification.is_none());
    }
}
