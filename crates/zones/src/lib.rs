//! Risk zone model, repository contract and the merged zone catalog.
//!
//! Two independently-sourced datasets feed geofencing: zones declared by the
//! user (trusted/safety zones) and zones synthesized from recently reported
//! incidents. This crate normalizes both into one [`Zone`] shape and merges
//! them into an atomically-swapped catalog snapshot.

mod catalog;
mod incident;
mod repository;
mod zone;

pub use catalog::ZoneCatalog;
pub use incident::{RawIncident, INCIDENT_ID_PREFIX, INCIDENT_WINDOW_HOURS, INCIDENT_ZONE_RADIUS_M};
pub use repository::{StaticZoneRepository, ZoneRepository, ZoneRepositoryRef};
pub use zone::{Zone, ZoneKind, ZoneSource};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ZoneError {
    #[error("invalid radius {radius} for zone {id}")]
    InvalidRadius { id: String, radius: f64 },
    #[error("repository error: {0}")]
    Repository(String),
}

pub type Result<T> = std::result::Result<T, ZoneError>;
