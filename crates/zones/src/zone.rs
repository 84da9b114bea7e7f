use serde::{Deserialize, Serialize};
use tourguard_geo::Position;

use crate::ZoneError;

/// Risk classification of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    /// Red: do not enter.
    Danger,
    /// Orange: moderate risk, caution advised.
    Medium,
    /// Green: explicitly safe area.
    Safe,
    /// Blue: public area, low risk nearby.
    Public,
}

impl ZoneKind {
    /// Severity ordering used for the rolling classification:
    /// Danger > Medium > Public > Safe.
    pub fn severity_rank(self) -> u8 {
        match self {
            ZoneKind::Danger => 3,
            ZoneKind::Medium => 2,
            ZoneKind::Public => 1,
            ZoneKind::Safe => 0,
        }
    }

    /// Short color label used in user-facing copy.
    pub fn color_label(self) -> &'static str {
        match self {
            ZoneKind::Danger => "Red",
            ZoneKind::Medium => "Orange",
            ZoneKind::Public => "Blue",
            ZoneKind::Safe => "Green",
        }
    }
}

/// Which dataset a zone came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneSource {
    /// User-declared trusted/safety zone; persists until its owner deletes it.
    Declared,
    /// Synthesized from a recent incident report; vanishes once the report
    /// falls out of the recency window.
    Incident,
}

/// A circular geographic region with a risk classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    /// Globally unique across both sources; incident-derived ids are
    /// prefixed so they can never collide with declared ids.
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub kind: ZoneKind,
    pub source: ZoneSource,
    #[serde(default)]
    pub description: Option<String>,
}

impl Zone {
    /// A zone must have a strictly positive radius. Creation-time rejection
    /// belongs to the zone-authoring collaborator; the catalog uses this to
    /// skip anything invalid that slipped into the store.
    pub fn validate(&self) -> crate::Result<()> {
        if self.radius_meters <= 0.0 || !self.radius_meters.is_finite() {
            return Err(ZoneError::InvalidRadius {
                id: self.id.clone(),
                radius: self.radius_meters,
            });
        }
        Ok(())
    }

    /// Distance from the zone center to a position, in meters.
    pub fn center_distance_m(&self, position: &Position) -> f64 {
        tourguard_geo::haversine_distance_m(
            self.latitude,
            self.longitude,
            position.latitude,
            position.longitude,
        )
    }

    /// Whether the position is inside the zone. The boundary is inclusive.
    pub fn contains(&self, position: &Position) -> bool {
        self.center_distance_m(position) <= self.radius_meters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(radius_meters: f64) -> Zone {
        Zone {
            id: "z1".into(),
            name: "Station Plaza".into(),
            latitude: 20.5937,
            longitude: 78.9629,
            radius_meters,
            kind: ZoneKind::Safe,
            source: ZoneSource::Declared,
            description: None,
        }
    }

    #[test]
    fn test_contains_is_boundary_inclusive() {
        let z = zone(500.0);
        let center = Position::at(z.latitude, z.longitude);
        assert!(z.contains(&center));

        // ~111.2 m per 0.001 degree of latitude: 0.0045 deg ~ 500 m.
        let near_edge = Position::at(z.latitude + 0.00449, z.longitude);
        assert!(z.contains(&near_edge), "just inside the boundary");

        let outside = Position::at(z.latitude + 0.0046, z.longitude);
        assert!(!z.contains(&outside), "strictly greater distance is outside");
    }

    #[test]
    fn test_validate_rejects_bad_radius() {
        assert!(zone(500.0).validate().is_ok());
        assert!(matches!(
            zone(0.0).validate(),
            Err(ZoneError::InvalidRadius { .. })
        ));
        assert!(zone(-10.0).validate().is_err());
        assert!(zone(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ZoneKind::Danger.severity_rank() > ZoneKind::Medium.severity_rank());
        assert!(ZoneKind::Medium.severity_rank() > ZoneKind::Public.severity_rank());
        assert!(ZoneKind::Public.severity_rank() > ZoneKind::Safe.severity_rank());
    }

    #[test]
    fn test_kind_serde_snake_case() {
        let json = serde_json::to_string(&ZoneKind::Danger).unwrap();
        assert_eq!(json, "\"danger\"");
        let kind: ZoneKind = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(kind, ZoneKind::Medium);
    }
}
