use tokio_util::sync::CancellationToken;

use crate::{GeoError, Position};

/// Bounded capacity of the position event channel. Position fixes arrive at
/// human walking pace, so a small buffer absorbs any consumer hiccup.
pub const WATCH_CHANNEL_CAPACITY: usize = 32;

/// One event on a continuous position watch.
///
/// Errors are delivered in-band and never terminate the subscription; the
/// producer keeps waiting for the next fix after a transient failure.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    Fix(Position),
    Error(GeoError),
}

/// Handle to a running position watch.
///
/// Cancelling is idempotent. Dropping the handle also stops the producer, so
/// a watch can never outlive its owner.
#[derive(Debug)]
pub struct WatchHandle {
    token: CancellationToken,
}

impl WatchHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Stop the watch. Safe to call any number of times.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
