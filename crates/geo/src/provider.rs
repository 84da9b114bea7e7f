//! Provider traits for permission negotiation and position acquisition.
//!
//! These traits are the platform seam: a native implementation wraps the OS
//! location service and its permission dialog, a browser implementation wraps
//! the web geolocation API where the substrate negotiates permission itself.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{Position, Result, WatchEvent, WatchHandle};

/// Options for one-shot reads and continuous watches.
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// How long a single fix attempt may take before the provider reports
    /// [`crate::GeoError::Timeout`].
    pub timeout: Duration,
    /// Maximum age of a cached fix the provider may hand back.
    pub max_position_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(20),
            max_position_age: Duration::from_secs(10),
        }
    }
}

/// Negotiates location permission with the platform.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Request location permission, returning whether it was granted.
    ///
    /// Native implementations show the OS dialog at most once per session and
    /// answer from the cached grant afterwards. Implicit substrates return
    /// `true` without any dialog.
    async fn request_permission(&self) -> bool;
}

pub type PermissionProviderRef = Arc<dyn PermissionProvider>;

/// Produces position fixes, one-shot or continuously.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    /// One-shot position read.
    async fn current_position(&self, options: &WatchOptions) -> Result<Position>;

    /// Start a continuous watch, delivering events through `tx`.
    ///
    /// Transient errors are sent as [`WatchEvent::Error`] and must not end
    /// the subscription. The watch stops when the returned handle is
    /// cancelled or dropped, or when the receiver side closes.
    async fn watch(
        &self,
        options: &WatchOptions,
        tx: mpsc::Sender<WatchEvent>,
    ) -> Result<WatchHandle>;
}

pub type PositionProviderRef = Arc<dyn PositionProvider>;

/// Permission provider for substrates that negotiate permission implicitly
/// when the first position read happens (browser-style). Always grants.
pub struct ImplicitPermission;

#[async_trait]
impl PermissionProvider for ImplicitPermission {
    async fn request_permission(&self) -> bool {
        true
    }
}
