//! Geofence evaluation and risk scoring.
//!
//! [`GeofenceEngine`] is the per-session state machine: one armed-flag per
//! zone dedups alerts within a continuous dwell, and a rolling classification
//! (most severe kind currently containing the observer) drives transition
//! notices and feeds the behavior monitor. [`RiskScorer`] is the pure,
//! display-only companion that never touches engine state.

mod geofence;
mod risk;

pub use geofence::{GeofenceEngine, GeofenceOutcome, DANGER_VIBRATION_PATTERN};
pub use risk::{RiskLevel, RiskScorer, RiskSnapshot};
