//! Endpoint pool management.
//!
//! # Responsibilities
//! - Hold the live endpoint set per logical service name
//! - Merge discovery refreshes, preserving health state for unchanged ids
//! - Serve routable snapshots to the executor concurrently with probe
//!   updates
//!
//! # Design Decisions
//! - Multi-reader/single-writer `RwLock` around the name → endpoints map;
//!   readers clone `Arc`s out, so no lock is held across awaits
//! - An endpoint is re-created (status back to Unknown) when its address
//!   or port changed: a moved instance is a different instance

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use crate::endpoints::endpoint::{Endpoint, EndpointRecord};

/// Outcome of a discovery refresh, consumed by the health checker to
/// reconcile probe tasks.
#[derive(Debug, Default)]
pub struct RefreshDelta {
    pub added: Vec<Arc<Endpoint>>,
    pub removed: Vec<Arc<Endpoint>>,
}

/// Live endpoint sets keyed by logical service name.
#[derive(Debug, Default)]
pub struct EndpointPool {
    services: RwLock<HashMap<String, Vec<Arc<Endpoint>>>>,
}

impl EndpointPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace/merge the endpoint set for `service` from a discovery report.
    ///
    /// Unchanged ids keep their live `Endpoint` (health state preserved,
    /// `last_seen` touched, metadata replaced); new ids enter as Unknown;
    /// ids absent from the report are dropped. Returns the delta so the
    /// caller can start/stop probe tasks.
    pub fn refresh(&self, service: &str, records: Vec<EndpointRecord>) -> RefreshDelta {
        let mut services = self.services.write().unwrap();
        let current = services.remove(service).unwrap_or_default();

        let mut delta = RefreshDelta::default();
        let mut next: Vec<Arc<Endpoint>> = Vec::with_capacity(records.len());

        for record in records {
            let existing = current.iter().find(|ep| {
                ep.id == record.id && ep.address == record.address && ep.port == record.port
            });
            match existing {
                Some(ep) => {
                    ep.touch();
                    ep.update_metadata(record.metadata);
                    next.push(ep.clone());
                }
                None => {
                    let ep = Arc::new(Endpoint::new(record));
                    debug!(
                        service = %service,
                        endpoint = %ep.id,
                        authority = %ep.authority(),
                        "endpoint discovered"
                    );
                    delta.added.push(ep.clone());
                    next.push(ep);
                }
            }
        }

        for ep in current {
            if !next.iter().any(|kept| Arc::ptr_eq(kept, &ep)) {
                debug!(
                    service = %service,
                    endpoint = %ep.id,
                    "endpoint dropped from discovery report"
                );
                delta.removed.push(ep);
            }
        }

        if !next.is_empty() {
            services.insert(service.to_string(), next);
        }

        if !delta.added.is_empty() || !delta.removed.is_empty() {
            info!(
                service = %service,
                added = delta.added.len(),
                removed = delta.removed.len(),
                "endpoint pool refreshed"
            );
        }
        delta
    }

    /// Snapshot of routable endpoints (everything not currently Unhealthy),
    /// in discovery order. Safe to call concurrently with probe updates.
    pub fn get_healthy(&self, service: &str) -> Vec<Arc<Endpoint>> {
        self.services
            .read()
            .unwrap()
            .get(service)
            .map(|endpoints| {
                endpoints
                    .iter()
                    .filter(|ep| ep.is_routable())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Snapshot of all endpoints for `service`, whatever their status.
    pub fn snapshot(&self, service: &str) -> Vec<Arc<Endpoint>> {
        self.services
            .read()
            .unwrap()
            .get(service)
            .cloned()
            .unwrap_or_default()
    }

    /// Remove one endpoint by id. Used by the health checker to deregister
    /// instances unhealthy beyond the configured grace period.
    pub fn remove(&self, service: &str, endpoint_id: &str) -> Option<Arc<Endpoint>> {
        let mut services = self.services.write().unwrap();
        let endpoints = services.get_mut(service)?;
        let idx = endpoints.iter().position(|ep| ep.id == endpoint_id)?;
        let removed = endpoints.remove(idx);
        if endpoints.is_empty() {
            services.remove(service);
        }
        Some(removed)
    }

    /// Logical service names currently tracked.
    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<_> = self.services.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::endpoint::EndpointStatus;

    fn record(id: &str, port: u16) -> EndpointRecord {
        EndpointRecord::new(id, "10.0.0.1", port)
    }

    #[test]
    fn refresh_reports_added_and_removed() {
        let pool = EndpointPool::new();
        let delta = pool.refresh("db", vec![record("a", 1), record("b", 2)]);
        assert_eq!(delta.added.len(), 2);
        assert!(delta.removed.is_empty());

        let delta = pool.refresh("db", vec![record("b", 2), record("c", 3)]);
        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.added[0].id, "c");
        assert_eq!(delta.removed.len(), 1);
        assert_eq!(delta.removed[0].id, "a");
    }

    #[test]
    fn refresh_preserves_health_state_for_unchanged_ids() {
        let pool = EndpointPool::new();
        pool.refresh("db", vec![record("a", 1)]);

        let ep = pool.snapshot("db")[0].clone();
        for _ in 0..3 {
            ep.mark_failure(3);
        }
        assert_eq!(ep.status(), EndpointStatus::Unhealthy);

        let delta = pool.refresh("db", vec![record("a", 1)]);
        assert!(delta.added.is_empty());
        assert_eq!(pool.snapshot("db")[0].status(), EndpointStatus::Unhealthy);
        assert!(Arc::ptr_eq(&pool.snapshot("db")[0], &ep));
    }

    #[test]
    fn moved_instance_is_recreated_as_unknown() {
        let pool = EndpointPool::new();
        pool.refresh("db", vec![record("a", 1)]);
        let ep = pool.snapshot("db")[0].clone();
        for _ in 0..3 {
            ep.mark_failure(3);
        }

        // same id, new port: treated as a fresh instance
        let delta = pool.refresh("db", vec![record("a", 9)]);
        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.removed.len(), 1);
        assert_eq!(pool.snapshot("db")[0].status(), EndpointStatus::Unknown);
    }

    #[test]
    fn get_healthy_excludes_unhealthy_only() {
        let pool = EndpointPool::new();
        pool.refresh("db", vec![record("a", 1), record("b", 2), record("c", 3)]);

        let endpoints = pool.snapshot("db");
        for _ in 0..3 {
            endpoints[1].mark_failure(3);
        }
        endpoints[2].mark_success(1);

        let healthy = pool.get_healthy("db");
        let ids: Vec<_> = healthy.iter().map(|ep| ep.id.as_str()).collect();
        // Unknown ("a") and Healthy ("c") are routable; Unhealthy ("b") is not
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn get_healthy_on_unknown_service_is_empty() {
        let pool = EndpointPool::new();
        assert!(pool.get_healthy("nope").is_empty());
    }

    #[test]
    fn remove_drops_endpoint_and_empty_service() {
        let pool = EndpointPool::new();
        pool.refresh("db", vec![record("a", 1)]);
        assert!(pool.remove("db", "a").is_some());
        assert!(pool.remove("db", "a").is_none());
        assert!(pool.services().is_empty());
    }
}
