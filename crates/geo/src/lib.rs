//! Cross-platform position acquisition.
//!
//! Abstracts one-shot and continuous position reads plus permission
//! negotiation behind provider traits, so the geofence core runs identically
//! whether the substrate is a native OS location service (explicit permission
//! dialog) or a browser-style API (implicit grant).

mod position;
mod provider;
mod sim;
mod watch;

pub use position::{haversine_distance_m, Position, EARTH_RADIUS_M};
pub use provider::{
    ImplicitPermission, PermissionProvider, PermissionProviderRef, PositionProvider,
    PositionProviderRef, WatchOptions,
};
pub use sim::SimulatedProvider;
pub use watch::{WatchEvent, WatchHandle, WATCH_CHANNEL_CAPACITY};

/// Errors surfaced by position providers.
///
/// Each error is terminal only for the operation that produced it: a watch
/// subscription reports errors through [`WatchEvent::Error`] and keeps
/// waiting for the next fix.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GeoError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position request timed out")]
    Timeout,
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, GeoError>;
