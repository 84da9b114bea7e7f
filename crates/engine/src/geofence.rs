use std::collections::HashSet;

use tourguard_events::{AlertSeverity, GeofenceAlert, TransitionNotice};
use tourguard_geo::Position;
use tourguard_zones::{Zone, ZoneKind};

/// Vibration pattern requested on danger-zone entry (on/off milliseconds).
pub const DANGER_VIBRATION_PATTERN: [u64; 3] = [200, 100, 200];

/// Result of evaluating one position against the catalog snapshot.
#[derive(Debug, Clone, Default)]
pub struct GeofenceOutcome {
    /// Every alert that qualified on this update, in catalog order.
    pub alerts: Vec<GeofenceAlert>,
    /// The one alert to surface when several qualify at once; Danger wins
    /// over Caution.
    pub displayed: Option<GeofenceAlert>,
    /// Emitted when the rolling classification changed on this update.
    pub transition: Option<TransitionNotice>,
    /// Most severe kind among zones currently containing the observer.
    pub classification: Option<ZoneKind>,
}

/// Per-session geofence state machine.
///
/// Per zone id the states are `Outside` -> `Inside` (armed, alert fired for
/// this dwell) -> back to `Outside` on exit. Arming is what dedups repeated
/// alerts while inside; disarming on exit is what re-enables alerting after
/// a genuine re-entry. This is the single source of truth for armed state:
/// no other component keeps a private copy.
#[derive(Debug, Default)]
pub struct GeofenceEngine {
    armed: HashSet<String>,
    classification: Option<ZoneKind>,
}

impl GeofenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one position against the full snapshot.
    ///
    /// Every zone is checked independently; being inside one zone never
    /// suppresses evaluation of another. Containment is boundary-inclusive.
    pub fn check(&mut self, position: &Position, zones: &[Zone]) -> GeofenceOutcome {
        let mut alerts = Vec::new();
        let mut rolling: Option<ZoneKind> = None;

        for zone in zones {
            if zone.contains(position) {
                rolling = Some(match rolling {
                    Some(current) if current.severity_rank() >= zone.kind.severity_rank() => {
                        current
                    }
                    _ => zone.kind,
                });

                if self.armed.contains(&zone.id) {
                    continue;
                }
                match zone.kind {
                    ZoneKind::Danger => {
                        alerts.push(GeofenceAlert {
                            severity: AlertSeverity::Danger,
                            zone_id: zone.id.clone(),
                            zone_name: zone.name.clone(),
                            message: format!(
                                "You have entered {}. Do not enter!",
                                zone.name
                            ),
                            haptic: true,
                        });
                        self.armed.insert(zone.id.clone());
                    }
                    ZoneKind::Medium => {
                        alerts.push(GeofenceAlert {
                            severity: AlertSeverity::Caution,
                            zone_id: zone.id.clone(),
                            zone_name: zone.name.clone(),
                            message: format!(
                                "You are in an Orange Zone ({}). Be careful.",
                                zone.name
                            ),
                            haptic: false,
                        });
                        self.armed.insert(zone.id.clone());
                    }
                    // Membership still counts toward the rolling
                    // classification, but no alert fires and nothing needs
                    // arming.
                    ZoneKind::Safe | ZoneKind::Public => {}
                }
            } else {
                self.armed.remove(&zone.id);
            }
        }

        let displayed = alerts
            .iter()
            .find(|alert| alert.severity == AlertSeverity::Danger)
            .or_else(|| alerts.first())
            .cloned();

        let transition = if rolling != self.classification {
            tracing::debug!(from = ?self.classification, to = ?rolling, "zone classification changed");
            Some(transition_notice(rolling))
        } else {
            None
        };
        self.classification = rolling;

        GeofenceOutcome {
            alerts,
            displayed,
            transition,
            classification: rolling,
        }
    }

    /// Rolling classification as of the last update.
    pub fn classification(&self) -> Option<ZoneKind> {
        self.classification
    }

    pub fn is_armed(&self, zone_id: &str) -> bool {
        self.armed.contains(zone_id)
    }

    /// Clear all per-dwell state (session end).
    pub fn reset(&mut self) {
        self.armed.clear();
        self.classification = None;
    }
}

fn transition_notice(classification: Option<ZoneKind>) -> TransitionNotice {
    let (severity, message) = match classification {
        Some(ZoneKind::Danger) => (
            AlertSeverity::Danger,
            "WARNING: You have entered a Red Zone (High Danger)!".to_string(),
        ),
        Some(ZoneKind::Medium) => (
            AlertSeverity::Caution,
            "Caution: You have entered an Orange Zone (Moderate Risk).".to_string(),
        ),
        Some(ZoneKind::Public) => (
            AlertSeverity::Info,
            "Info: You are in a Blue Zone (Low Risk areas nearby).".to_string(),
        ),
        Some(ZoneKind::Safe) => (
            AlertSeverity::Success,
            "You are in a Green Zone (Safe Area).".to_string(),
        ),
        None => (
            AlertSeverity::Info,
            "You have left all monitored zones.".to_string(),
        ),
    };
    TransitionNotice {
        severity,
        message,
        classification,
    }
}
