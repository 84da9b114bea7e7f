use serde::{Deserialize, Serialize};
use tourguard_geo::Position;
use tourguard_zones::{Zone, ZoneKind};

/// Displayed risk category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Derived safety snapshot for display. Recomputed every position update,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub level: RiskLevel,
    /// Safety score in [0, 100]; higher is safer.
    pub score: f64,
    pub label: String,
    #[serde(default)]
    pub nearby_zone_name: Option<String>,
}

impl Default for RiskSnapshot {
    fn default() -> Self {
        Self {
            level: RiskLevel::Low,
            score: 87.5,
            label: "You're Safe".into(),
            nearby_zone_name: None,
        }
    }
}

/// Pure scorer over the current snapshot: no side effects, safe to call on
/// every tick without touching the engine's armed state.
pub struct RiskScorer;

impl RiskScorer {
    /// Highest-priority containing zone wins: Danger > Medium; a Safe zone
    /// only contributes its name while the score stays at the default.
    pub fn score(position: &Position, zones: &[Zone]) -> RiskSnapshot {
        let mut snapshot = RiskSnapshot::default();

        for zone in zones {
            if !zone.contains(position) {
                continue;
            }
            match zone.kind {
                ZoneKind::Danger => {
                    snapshot = RiskSnapshot {
                        level: RiskLevel::High,
                        score: 25.0,
                        label: "Danger Zone".into(),
                        nearby_zone_name: Some(zone.name.clone()),
                    };
                }
                ZoneKind::Medium if snapshot.level != RiskLevel::High => {
                    snapshot = RiskSnapshot {
                        level: RiskLevel::Medium,
                        score: 55.0,
                        label: "Caution Advised".into(),
                        nearby_zone_name: Some(zone.name.clone()),
                    };
                }
                ZoneKind::Safe if snapshot.level == RiskLevel::Low => {
                    snapshot.nearby_zone_name = Some(zone.name.clone());
                }
                _ => {}
            }
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourguard_zones::ZoneSource;

    fn zone(id: &str, kind: ZoneKind, radius_meters: f64) -> Zone {
        Zone {
            id: id.into(),
            name: format!("Zone {id}"),
            latitude: 10.0,
            longitude: 20.0,
            radius_meters,
            kind,
            source: ZoneSource::Declared,
            description: None,
        }
    }

    fn here() -> Position {
        Position::at(10.0, 20.0)
    }

    #[test]
    fn test_default_when_outside_everything() {
        let snapshot = RiskScorer::score(&Position::at(50.0, 50.0), &[zone("d", ZoneKind::Danger, 500.0)]);
        assert_eq!(snapshot.level, RiskLevel::Low);
        assert_eq!(snapshot.score, 87.5);
        assert_eq!(snapshot.label, "You're Safe");
        assert!(snapshot.nearby_zone_name.is_none());
    }

    #[test]
    fn test_danger_dominates() {
        let zones = [
            zone("m", ZoneKind::Medium, 500.0),
            zone("d", ZoneKind::Danger, 500.0),
            zone("s", ZoneKind::Safe, 500.0),
        ];
        let snapshot = RiskScorer::score(&here(), &zones);
        assert_eq!(snapshot.level, RiskLevel::High);
        assert_eq!(snapshot.score, 25.0);
        assert_eq!(snapshot.label, "Danger Zone");
        assert_eq!(snapshot.nearby_zone_name.as_deref(), Some("Zone d"));
    }

    #[test]
    fn test_medium_beats_safe_regardless_of_order() {
        for zones in [
            [zone("m", ZoneKind::Medium, 500.0), zone("s", ZoneKind::Safe, 500.0)],
            [zone("s", ZoneKind::Safe, 500.0), zone("m", ZoneKind::Medium, 500.0)],
        ] {
            let snapshot = RiskScorer::score(&here(), &zones);
            assert_eq!(snapshot.level, RiskLevel::Medium, "never Low inside Medium");
            assert_eq!(snapshot.score, 55.0);
            assert_eq!(snapshot.nearby_zone_name.as_deref(), Some("Zone m"));
        }
    }

    #[test]
    fn test_safe_zone_records_name_only() {
        let snapshot = RiskScorer::score(&here(), &[zone("s", ZoneKind::Safe, 500.0)]);
        assert_eq!(snapshot.level, RiskLevel::Low);
        assert_eq!(snapshot.score, 87.5);
        assert_eq!(snapshot.nearby_zone_name.as_deref(), Some("Zone s"));
    }

    #[test]
    fn test_idempotent() {
        let zones = [zone("d", ZoneKind::Danger, 500.0)];
        let a = RiskScorer::score(&here(), &zones);
        let b = RiskScorer::score(&here(), &zones);
        assert_eq!(a, b);
    }
}
