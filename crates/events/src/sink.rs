//! Sink traits for outbound events.
//!
//! Trait objects decouple the core loop from delivery: production wires a
//! notification UI and a remote record store, tests wire the in-memory
//! doubles below.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{EmergencyRecord, Notification, RecordId};

#[derive(Debug, Clone, thiserror::Error)]
pub enum SinkError {
    #[error("record creation failed: {0}")]
    Repository(String),
}

/// Receives user-facing notifications. Fire-and-forget: implementations must
/// never block the geofence loop.
pub trait AlertSink: Send + Sync {
    fn notify(&self, notification: Notification);

    /// Request device vibration with the given on/off pattern, where
    /// supported. Default: unsupported, ignored.
    fn vibrate(&self, _pattern: &[u64]) {}
}

pub type AlertSinkRef = Arc<dyn AlertSink>;

/// Creates emergency records with the remote store. Best-effort at call
/// sites: failure is logged and surfaced, never propagated into the loop.
#[async_trait]
pub trait IncidentSink: Send + Sync {
    async fn create_emergency_record(&self, record: EmergencyRecord) -> Result<RecordId, SinkError>;
}

pub type IncidentSinkRef = Arc<dyn IncidentSink>;

/// Alert sink that captures everything for later inspection.
#[derive(Default)]
pub struct InMemoryAlertSink {
    notifications: Mutex<Vec<Notification>>,
    vibrations: Mutex<Vec<Vec<u64>>>,
}

impl InMemoryAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .expect("notifications mutex poisoned")
            .clone()
    }

    /// Messages only, in emission order.
    pub fn messages(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }

    pub fn vibrations(&self) -> Vec<Vec<u64>> {
        self.vibrations
            .lock()
            .expect("vibrations mutex poisoned")
            .clone()
    }

    pub fn clear(&self) {
        self.notifications
            .lock()
            .expect("notifications mutex poisoned")
            .clear();
        self.vibrations
            .lock()
            .expect("vibrations mutex poisoned")
            .clear();
    }

    pub fn len(&self) -> usize {
        self.notifications
            .lock()
            .expect("notifications mutex poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AlertSink for InMemoryAlertSink {
    fn notify(&self, notification: Notification) {
        self.notifications
            .lock()
            .expect("notifications mutex poisoned")
            .push(notification);
    }

    fn vibrate(&self, pattern: &[u64]) {
        self.vibrations
            .lock()
            .expect("vibrations mutex poisoned")
            .push(pattern.to_vec());
    }
}

/// Alert sink that discards everything.
pub struct NullAlertSink;

impl AlertSink for NullAlertSink {
    fn notify(&self, _notification: Notification) {}
}

/// Incident sink recording created records, with a failure toggle.
#[derive(Default)]
pub struct InMemoryIncidentSink {
    records: Mutex<Vec<EmergencyRecord>>,
    fail: AtomicBool,
}

impl InMemoryIncidentSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EmergencyRecord> {
        self.records.lock().expect("records mutex poisoned").clone()
    }

    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl IncidentSink for InMemoryIncidentSink {
    async fn create_emergency_record(&self, record: EmergencyRecord) -> Result<RecordId, SinkError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SinkError::Repository("sos insert rejected".into()));
        }
        self.records
            .lock()
            .expect("records mutex poisoned")
            .push(record);
        Ok(RecordId::new())
    }
}
