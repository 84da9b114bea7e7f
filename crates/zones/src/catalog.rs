use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{Duration, Utc};

use crate::{RawIncident, Zone, ZoneRepositoryRef, INCIDENT_WINDOW_HOURS};

/// Merged, atomically-swapped snapshot of all active zones.
///
/// `reload` rebuilds the full set from both sources and replaces the snapshot
/// in one write; `current` hands out the latest complete snapshot without
/// ever blocking on in-flight I/O. Readers see either the old set or the new
/// set, never a mix.
pub struct ZoneCatalog {
    repository: ZoneRepositoryRef,
    owner_id: String,
    snapshot: RwLock<Arc<Vec<Zone>>>,
    loaded: AtomicBool,
}

impl ZoneCatalog {
    pub fn new(repository: ZoneRepositoryRef, owner_id: impl Into<String>) -> Self {
        Self {
            repository,
            owner_id: owner_id.into(),
            snapshot: RwLock::new(Arc::new(Vec::new())),
            loaded: AtomicBool::new(false),
        }
    }

    /// Fetch both sources and swap in the merged snapshot.
    ///
    /// A failed fetch degrades that source to empty rather than erroring
    /// upward; geofencing keeps running on whatever data is available.
    /// Returns the size of the new snapshot.
    pub async fn reload(&self) -> usize {
        let declared = match self.repository.fetch_declared_zones(&self.owner_id).await {
            Ok(zones) => zones,
            Err(error) => {
                tracing::warn!(%error, "declared zone fetch failed, using empty set");
                Vec::new()
            }
        };

        let since = Utc::now() - Duration::hours(INCIDENT_WINDOW_HOURS);
        let incidents = match self.repository.fetch_recent_incidents(since).await {
            Ok(incidents) => incidents,
            Err(error) => {
                tracing::warn!(%error, "incident fetch failed, using empty set");
                Vec::new()
            }
        };

        let mut merged: Vec<Zone> = Vec::with_capacity(declared.len() + incidents.len());
        for zone in declared {
            if let Err(error) = zone.validate() {
                tracing::warn!(%error, "skipping invalid declared zone");
                continue;
            }
            merged.push(zone);
        }
        merged.extend(incidents.into_iter().filter_map(RawIncident::into_zone));

        let count = merged.len();
        *self.snapshot.write().expect("snapshot lock poisoned") = Arc::new(merged);
        self.loaded.store(true, Ordering::SeqCst);
        tracing::debug!(zones = count, "zone catalog reloaded");
        count
    }

    /// Latest complete snapshot. Never blocks on a reload in progress.
    pub fn current(&self) -> Arc<Vec<Zone>> {
        Arc::clone(&self.snapshot.read().expect("snapshot lock poisoned"))
    }

    /// Whether at least one reload has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RawIncident, StaticZoneRepository, ZoneKind, ZoneSource};
    use std::sync::Arc;

    fn declared(id: &str, radius_meters: f64) -> Zone {
        Zone {
            id: id.into(),
            name: format!("Zone {id}"),
            latitude: 10.0,
            longitude: 20.0,
            radius_meters,
            kind: ZoneKind::Safe,
            source: ZoneSource::Declared,
            description: None,
        }
    }

    fn incident(id: &str, severity: &str) -> RawIncident {
        RawIncident {
            id: id.into(),
            incident_type: "Assault".into(),
            severity: severity.into(),
            latitude: Some(10.0),
            longitude: Some(20.0),
            description: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_merge_declared_and_incidents() {
        let repo = Arc::new(StaticZoneRepository::new());
        repo.push_zone(declared("z1", 400.0));
        repo.push_incident(incident("5", "critical"));

        let catalog = ZoneCatalog::new(repo, "owner-1");
        assert!(!catalog.is_loaded());
        assert!(catalog.current().is_empty());

        let count = catalog.reload().await;
        assert_eq!(count, 2);
        assert!(catalog.is_loaded());

        let snapshot = catalog.current();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, "z1");
        assert_eq!(snapshot[1].id, "inc-5");
        assert_eq!(snapshot[1].kind, ZoneKind::Danger);
        assert_eq!(snapshot[1].radius_meters, 500.0);
    }

    #[tokio::test]
    async fn test_failed_source_degrades_to_empty() {
        let repo = Arc::new(StaticZoneRepository::new());
        repo.push_zone(declared("z1", 400.0));
        repo.push_incident(incident("7", "high"));
        repo.fail_incidents(true);

        let catalog = ZoneCatalog::new(repo.clone(), "owner-1");
        assert_eq!(catalog.reload().await, 1);
        assert_eq!(catalog.current()[0].id, "z1");

        // Both sources down still counts as a (successful, empty) reload.
        repo.fail_zones(true);
        assert_eq!(catalog.reload().await, 0);
        assert!(catalog.is_loaded());
    }

    #[tokio::test]
    async fn test_invalid_declared_zone_is_skipped() {
        let repo = Arc::new(StaticZoneRepository::new());
        repo.push_zone(declared("ok", 250.0));
        repo.push_zone(declared("bad", 0.0));

        let catalog = ZoneCatalog::new(repo, "owner-1");
        assert_eq!(catalog.reload().await, 1);
        assert_eq!(catalog.current()[0].id, "ok");
    }

    #[tokio::test]
    async fn test_reload_replaces_snapshot() {
        let repo = Arc::new(StaticZoneRepository::new());
        repo.push_zone(declared("z1", 400.0));

        let catalog = ZoneCatalog::new(repo.clone(), "owner-1");
        catalog.reload().await;
        let first = catalog.current();

        repo.push_zone(declared("z2", 400.0));
        catalog.reload().await;
        let second = catalog.current();

        // Old snapshot unchanged in the reader's hands, new one complete.
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
    }
}
