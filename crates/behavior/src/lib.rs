//! Behavioral anomaly detection over the position stream.
//!
//! Two independent detectors share the stream: stillness (no significant
//! movement for too long, potential stuck/injured observer) and danger-dwell
//! (remaining classified inside a red area for too long). Each produces
//! synthetic emergency triggers, rate-limited by a per-kind cooldown.
//!
//! The monitor is a pure state machine over `(position, classification, now)`
//! so it can be driven deterministically in tests; all sink I/O happens in
//! the session layer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tourguard_events::SyntheticTrigger;
use tourguard_geo::Position;
use tourguard_zones::ZoneKind;

/// Thresholds and cooldowns for the anomaly detectors.
///
/// All values are named configuration, not hard-coded in the detectors, so
/// deployments can tune them without touching detection logic.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorConfig {
    /// Movement below this distance does not reset the stillness anchor.
    pub movement_threshold_m: f64,
    /// How long without significant movement before the stillness trigger.
    pub static_threshold: Duration,
    /// How long continuously classified Danger before the dwell trigger.
    pub dwell_threshold: Duration,
    /// Minimum gap between two triggers of the same kind.
    pub trigger_cooldown: Duration,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            movement_threshold_m: 100.0,
            static_threshold: Duration::from_secs(5 * 60),
            dwell_threshold: Duration::from_secs(2 * 60),
            trigger_cooldown: Duration::from_secs(60),
        }
    }
}

/// Session-scoped behavior state. Owned exclusively by the session's event
/// loop; never read by any other component.
#[derive(Debug)]
pub struct BehaviorMonitor {
    config: BehaviorConfig,
    /// Last position that counted as movement, and when.
    last_move: Option<(Position, DateTime<Utc>)>,
    /// When the rolling classification first became Danger, if it still is.
    danger_entry: Option<DateTime<Utc>>,
    last_stillness_trigger: Option<DateTime<Utc>>,
    last_dwell_trigger: Option<DateTime<Utc>>,
}

impl Default for BehaviorMonitor {
    fn default() -> Self {
        Self::new(BehaviorConfig::default())
    }
}

impl BehaviorMonitor {
    pub fn new(config: BehaviorConfig) -> Self {
        Self {
            config,
            last_move: None,
            danger_entry: None,
            last_stillness_trigger: None,
            last_dwell_trigger: None,
        }
    }

    pub fn config(&self) -> BehaviorConfig {
        self.config
    }

    /// Feed one position update. `classification` is the engine's rolling
    /// classification for the same update; `now` is the event time.
    ///
    /// Returns zero or more triggers for the session layer to dispatch.
    pub fn observe(
        &mut self,
        position: &Position,
        classification: Option<ZoneKind>,
        now: DateTime<Utc>,
    ) -> Vec<SyntheticTrigger> {
        let mut triggers = Vec::new();

        if let Some(trigger) = self.check_stillness(position, now) {
            triggers.push(trigger);
        }
        if let Some(trigger) = self.check_danger_dwell(position, classification, now) {
            triggers.push(trigger);
        }

        triggers
    }

    fn check_stillness(
        &mut self,
        position: &Position,
        now: DateTime<Utc>,
    ) -> Option<SyntheticTrigger> {
        let Some((anchor, since)) = self.last_move else {
            self.last_move = Some((*position, now));
            return None;
        };

        if position.distance_m(&anchor) >= self.config.movement_threshold_m {
            // Counts as moving again.
            self.last_move = Some((*position, now));
            return None;
        }

        let elapsed = now - since;
        if elapsed <= to_chrono(self.config.static_threshold) {
            return None;
        }
        if !self.cooldown_elapsed(self.last_stillness_trigger, now) {
            return None;
        }

        self.last_stillness_trigger = Some(now);
        let minutes = self.config.static_threshold.as_secs() / 60;
        tracing::warn!(minutes, "observer static beyond threshold, raising trigger");
        Some(SyntheticTrigger::automated(
            format!("Location unchanged for {minutes} minutes. Potential stuck/injured."),
            *position,
        ))
    }

    fn check_danger_dwell(
        &mut self,
        position: &Position,
        classification: Option<ZoneKind>,
        now: DateTime<Utc>,
    ) -> Option<SyntheticTrigger> {
        if classification != Some(ZoneKind::Danger) {
            self.danger_entry = None;
            return None;
        }

        let Some(entry) = self.danger_entry else {
            self.danger_entry = Some(now);
            return None;
        };

        if now - entry <= to_chrono(self.config.dwell_threshold) {
            return None;
        }
        if !self.cooldown_elapsed(self.last_dwell_trigger, now) {
            return None;
        }

        self.last_dwell_trigger = Some(now);
        let minutes = self.config.dwell_threshold.as_secs() / 60;
        tracing::warn!(minutes, "prolonged danger-zone dwell, raising trigger");
        Some(SyntheticTrigger::automated(
            format!("In high-risk zone for over {minutes} minutes."),
            *position,
        ))
    }

    fn cooldown_elapsed(&self, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last {
            None => true,
            Some(last) => now - last > to_chrono(self.config.trigger_cooldown),
        }
    }

    /// Clear all detector state (session end).
    pub fn reset(&mut self) {
        self.last_move = None;
        self.danger_entry = None;
        self.last_stillness_trigger = None;
        self.last_dwell_trigger = None;
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> BehaviorConfig {
        BehaviorConfig {
            movement_threshold_m: 100.0,
            static_threshold: Duration::from_secs(300),
            dwell_threshold: Duration::from_secs(120),
            trigger_cooldown: Duration::from_secs(60),
        }
    }

    fn t(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    fn pos(lat: f64, lon: f64) -> Position {
        Position::new(lat, lon, 5.0, Utc::now())
    }

    #[test]
    fn test_stillness_fires_once_after_threshold() {
        let mut monitor = BehaviorMonitor::new(config());
        let here = pos(10.0, 20.0);

        // Anchor established, then repeated ticks with no movement.
        assert!(monitor.observe(&here, None, t(0)).is_empty());
        assert!(monitor.observe(&here, None, t(100)).is_empty());
        assert!(monitor.observe(&here, None, t(299)).is_empty());

        let triggers = monitor.observe(&here, None, t(301));
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].emergency_type, "other");
        assert!(triggers[0].description.contains("unchanged for 5 minutes"));

        // Continued stillness inside the cooldown stays quiet.
        assert!(monitor.observe(&here, None, t(320)).is_empty());
        assert!(monitor.observe(&here, None, t(359)).is_empty());

        // Cooldown elapsed and still static: fires again.
        assert_eq!(monitor.observe(&here, None, t(365)).len(), 1);
    }

    #[test]
    fn test_movement_resets_stillness_anchor() {
        let mut monitor = BehaviorMonitor::new(config());
        let start = pos(10.0, 20.0);
        // ~111 m north: above the movement threshold.
        let moved = pos(10.001, 20.0);

        assert!(monitor.observe(&start, None, t(0)).is_empty());
        assert!(monitor.observe(&moved, None, t(290)).is_empty());
        // 300+ seconds after the first fix, but only ~15 after the move.
        assert!(monitor.observe(&moved, None, t(305)).is_empty());
    }

    #[test]
    fn test_small_jitter_does_not_count_as_movement() {
        let mut monitor = BehaviorMonitor::new(config());
        let start = pos(10.0, 20.0);
        // ~11 m: GPS jitter, below the movement threshold.
        let jitter = pos(10.0001, 20.0);

        assert!(monitor.observe(&start, None, t(0)).is_empty());
        assert!(monitor.observe(&jitter, None, t(200)).is_empty());
        assert_eq!(monitor.observe(&jitter, None, t(301)).len(), 1);
    }

    #[test]
    fn test_danger_dwell_fires_after_threshold() {
        let mut monitor = BehaviorMonitor::new(config());
        let danger = Some(ZoneKind::Danger);

        // Move each tick so stillness never interferes.
        assert!(monitor.observe(&pos(10.0, 20.0), danger, t(0)).is_empty());
        assert!(monitor.observe(&pos(10.002, 20.0), danger, t(60)).is_empty());

        let triggers = monitor.observe(&pos(10.004, 20.0), danger, t(121));
        assert_eq!(triggers.len(), 1);
        assert!(triggers[0].description.contains("high-risk zone"));
    }

    #[test]
    fn test_leaving_danger_clears_entry_timestamp() {
        let mut monitor = BehaviorMonitor::new(config());
        let danger = Some(ZoneKind::Danger);

        assert!(monitor.observe(&pos(10.0, 20.0), danger, t(0)).is_empty());
        // Leaves the red area: the entry timestamp resets.
        assert!(monitor
            .observe(&pos(10.002, 20.0), Some(ZoneKind::Safe), t(60))
            .is_empty());
        // Re-enters: the clock starts over, so nothing at t=130.
        assert!(monitor.observe(&pos(10.004, 20.0), danger, t(70)).is_empty());
        assert!(monitor.observe(&pos(10.006, 20.0), danger, t(130)).is_empty());
        // Only after a full threshold from re-entry.
        assert_eq!(monitor.observe(&pos(10.008, 20.0), danger, t(195)).len(), 1);
    }

    #[test]
    fn test_cooldowns_are_independent_per_kind() {
        let mut monitor = BehaviorMonitor::new(config());
        let here = pos(10.0, 20.0);
        let danger = Some(ZoneKind::Danger);

        // Static AND dwelling in danger: both detectors past threshold at
        // t=301 (stillness from t=0, dwell from t=0).
        assert!(monitor.observe(&here, danger, t(0)).is_empty());
        let triggers = monitor.observe(&here, danger, t(301));
        assert_eq!(triggers.len(), 2, "one trigger per detector kind");
    }

    #[test]
    fn test_reset_clears_state() {
        let mut monitor = BehaviorMonitor::new(config());
        let here = pos(10.0, 20.0);

        monitor.observe(&here, None, t(0));
        monitor.reset();

        // Anchor gone: the next observation re-establishes it instead of
        // measuring five minutes of stillness.
        assert!(monitor.observe(&here, None, t(600)).is_empty());
        assert!(monitor.observe(&here, None, t(700)).is_empty());
    }
}
