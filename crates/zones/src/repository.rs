use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{RawIncident, Result, Zone, ZoneError};

/// Remote store contract for both zone datasets.
///
/// Implementations wrap whatever queryable backend the deployment uses. The
/// catalog treats any failure here as "empty for that source", so geofencing
/// degrades gracefully instead of stalling.
#[async_trait]
pub trait ZoneRepository: Send + Sync {
    /// Zones the given owner has declared.
    async fn fetch_declared_zones(&self, owner_id: &str) -> Result<Vec<Zone>>;

    /// Incident reports created after `since`.
    async fn fetch_recent_incidents(&self, since: DateTime<Utc>) -> Result<Vec<RawIncident>>;
}

pub type ZoneRepositoryRef = Arc<dyn ZoneRepository>;

/// In-memory repository for tests, with scriptable per-source failure and an
/// optional artificial fetch latency.
#[derive(Default)]
pub struct StaticZoneRepository {
    zones: Mutex<Vec<Zone>>,
    incidents: Mutex<Vec<RawIncident>>,
    fail_zones: AtomicBool,
    fail_incidents: AtomicBool,
    latency: Option<Duration>,
}

impl StaticZoneRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn push_zone(&self, zone: Zone) {
        self.zones.lock().expect("zones mutex poisoned").push(zone);
    }

    pub fn push_incident(&self, incident: RawIncident) {
        self.incidents
            .lock()
            .expect("incidents mutex poisoned")
            .push(incident);
    }

    pub fn fail_zones(&self, fail: bool) {
        self.fail_zones.store(fail, Ordering::SeqCst);
    }

    pub fn fail_incidents(&self, fail: bool) {
        self.fail_incidents.store(fail, Ordering::SeqCst);
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ZoneRepository for StaticZoneRepository {
    async fn fetch_declared_zones(&self, _owner_id: &str) -> Result<Vec<Zone>> {
        self.simulate_latency().await;
        if self.fail_zones.load(Ordering::SeqCst) {
            return Err(ZoneError::Repository("declared zone fetch failed".into()));
        }
        Ok(self.zones.lock().expect("zones mutex poisoned").clone())
    }

    async fn fetch_recent_incidents(&self, since: DateTime<Utc>) -> Result<Vec<RawIncident>> {
        self.simulate_latency().await;
        if self.fail_incidents.load(Ordering::SeqCst) {
            return Err(ZoneError::Repository("incident fetch failed".into()));
        }
        Ok(self
            .incidents
            .lock()
            .expect("incidents mutex poisoned")
            .iter()
            .filter(|incident| incident.created_at > since)
            .cloned()
            .collect())
    }
}
