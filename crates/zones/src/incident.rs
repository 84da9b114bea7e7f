use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Zone, ZoneKind, ZoneSource};

/// Incident reports older than this never become zones.
pub const INCIDENT_WINDOW_HOURS: i64 = 24;

/// Fixed radius synthesized around an incident location.
pub const INCIDENT_ZONE_RADIUS_M: f64 = 500.0;

/// Namespace prefix keeping incident-derived ids disjoint from declared ids.
pub const INCIDENT_ID_PREFIX: &str = "inc-";

/// An incident report as stored by the reporting collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawIncident {
    pub id: String,
    pub incident_type: String,
    pub severity: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RawIncident {
    /// Synthesize a zone from this incident, or `None` when the report has
    /// no usable coordinates.
    pub fn into_zone(self) -> Option<Zone> {
        let (latitude, longitude) = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                tracing::debug!(incident = %self.id, "dropping incident without coordinates");
                return None;
            }
        };

        Some(Zone {
            id: format!("{INCIDENT_ID_PREFIX}{}", self.id),
            name: format!("Reported Incident: {}", self.incident_type),
            latitude,
            longitude,
            radius_meters: INCIDENT_ZONE_RADIUS_M,
            kind: kind_for_severity(&self.severity),
            source: ZoneSource::Incident,
            description: self.description,
        })
    }
}

/// Severity-to-kind mapping for incident-derived zones.
pub fn kind_for_severity(severity: &str) -> ZoneKind {
    match severity {
        "critical" => ZoneKind::Danger,
        "high" => ZoneKind::Medium,
        "medium" => ZoneKind::Public,
        _ => ZoneKind::Safe,
    }
}
