//! Endpoint discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Discovery backend (consensus store, orchestrator API, static list)
//!     → Discovery trait (fetch_endpoints pull / watch push)
//!     → DiscoveryWorker (periodic pull, or apply() fed by a watch)
//!     → EndpointPool::refresh → HealthChecker::sync
//! ```
//!
//! # Design Decisions
//! - One capability contract with swappable implementations selected by
//!   configuration, not an inheritance hierarchy
//! - Wire-level backend clients live outside this crate; `StaticDiscovery`
//!   is the in-tree reference implementation
//! - A failed fetch keeps the previous endpoint set: routing on stale data
//!   beats routing on no data

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::endpoints::{EndpointPool, EndpointRecord};
use crate::error::DiscoveryError;
use crate::health::HealthChecker;

/// Capability contract for endpoint discovery backends.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Current endpoint list for a logical service (pull).
    async fn fetch_endpoints(&self, service: &str)
        -> Result<Vec<EndpointRecord>, DiscoveryError>;

    /// Stream refreshed lists into `tx` until the backend decides to stop
    /// (push). The default emits one snapshot and returns; polling backends
    /// need nothing more, watch-capable backends override.
    async fn watch(
        &self,
        service: &str,
        tx: mpsc::Sender<Vec<EndpointRecord>>,
    ) -> Result<(), DiscoveryError> {
        let records = self.fetch_endpoints(service).await?;
        tx.send(records)
            .await
            .map_err(|_| DiscoveryError::Unavailable("watch receiver dropped".into()))
    }
}

/// Fixed endpoint lists, typically lifted from the embedding service's
/// config file. The reference [`Discovery`] implementation.
#[derive(Debug, Default)]
pub struct StaticDiscovery {
    entries: HashMap<String, Vec<EndpointRecord>>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(
        mut self,
        service: impl Into<String>,
        records: Vec<EndpointRecord>,
    ) -> Self {
        self.entries.insert(service.into(), records);
        self
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn fetch_endpoints(
        &self,
        service: &str,
    ) -> Result<Vec<EndpointRecord>, DiscoveryError> {
        Ok(self.entries.get(service).cloned().unwrap_or_default())
    }
}

/// Feeds discovery reports into the pool and keeps the health checker's
/// probe tasks reconciled.
pub struct DiscoveryWorker {
    discovery: Arc<dyn Discovery>,
    pool: Arc<EndpointPool>,
    checker: Arc<HealthChecker>,
    services: Vec<String>,
    interval: Duration,
}

impl DiscoveryWorker {
    pub fn new(
        discovery: Arc<dyn Discovery>,
        pool: Arc<EndpointPool>,
        checker: Arc<HealthChecker>,
        services: Vec<String>,
        interval: Duration,
    ) -> Self {
        Self {
            discovery,
            pool,
            checker,
            services,
            interval,
        }
    }

    /// Apply one discovery report. Also the entrypoint for push-style
    /// backends: drain a `watch` channel into this.
    pub fn apply(&self, service: &str, records: Vec<EndpointRecord>) {
        let delta = self.pool.refresh(service, records);
        if !delta.added.is_empty() || !delta.removed.is_empty() {
            self.checker.sync(service);
        }
    }

    /// Periodic pull loop; stops when `token` fires.
    pub async fn run(self, token: CancellationToken) {
        info!(
            services = ?self.services,
            interval_secs = self.interval.as_secs(),
            "discovery worker starting"
        );
        let mut ticker = time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = token.cancelled() => break,
            }
            for service in &self.services {
                match self.discovery.fetch_endpoints(service).await {
                    Ok(records) => self.apply(service, records),
                    Err(error) => {
                        warn!(
                            service = %service,
                            error = %error,
                            "discovery fetch failed, keeping previous endpoint set"
                        );
                    }
                }
            }
        }
        info!("discovery worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResiliencePolicies;
    use crate::endpoints::Endpoint;
    use crate::health::FnProbe;

    fn worker_fixture(
        discovery: Arc<dyn Discovery>,
    ) -> (DiscoveryWorker, Arc<EndpointPool>, Arc<HealthChecker>) {
        let pool = Arc::new(EndpointPool::new());
        let probe = Arc::new(FnProbe::new(|_: &Endpoint| async { Ok(()) }));
        let checker = Arc::new(HealthChecker::new(
            pool.clone(),
            probe,
            Arc::new(ResiliencePolicies::default()),
        ));
        let worker = DiscoveryWorker::new(
            discovery,
            pool.clone(),
            checker.clone(),
            vec!["db".into()],
            Duration::from_millis(50),
        );
        (worker, pool, checker)
    }

    #[tokio::test]
    async fn static_discovery_round_trips_records() {
        let discovery = StaticDiscovery::new()
            .with_service("db", vec![EndpointRecord::new("a", "10.0.0.1", 5432)]);
        let records = discovery.fetch_endpoints("db").await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(discovery.fetch_endpoints("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn default_watch_emits_one_snapshot() {
        let discovery = StaticDiscovery::new()
            .with_service("db", vec![EndpointRecord::new("a", "10.0.0.1", 5432)]);
        let (tx, mut rx) = mpsc::channel(1);
        discovery.watch("db", tx).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pull_loop_populates_pool_and_spawns_probes() {
        let discovery: Arc<dyn Discovery> = Arc::new(StaticDiscovery::new().with_service(
            "db",
            vec![
                EndpointRecord::new("a", "10.0.0.1", 1),
                EndpointRecord::new("b", "10.0.0.2", 2),
            ],
        ));
        let (worker, pool, checker) = worker_fixture(discovery);

        let token = CancellationToken::new();
        let handle = tokio::spawn(worker.run(token.clone()));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(pool.snapshot("db").len(), 2);
        assert_eq!(checker.active_probes(), 2);

        token.cancel();
        handle.await.unwrap();
        checker.shutdown();
    }

    #[tokio::test]
    async fn apply_reconciles_removed_endpoints() {
        let discovery: Arc<dyn Discovery> = Arc::new(StaticDiscovery::new());
        let (worker, pool, checker) = worker_fixture(discovery);

        worker.apply(
            "db",
            vec![
                EndpointRecord::new("a", "10.0.0.1", 1),
                EndpointRecord::new("b", "10.0.0.2", 2),
            ],
        );
        assert_eq!(checker.active_probes(), 2);

        worker.apply("db", vec![EndpointRecord::new("b", "10.0.0.2", 2)]);
        assert_eq!(pool.snapshot("db").len(), 1);
        assert_eq!(checker.active_probes(), 1);

        checker.shutdown();
    }
}
