//! Active health checking.
//!
//! # Responsibilities
//! - Run one independent periodic probe task per pooled endpoint
//! - Fold probe verdicts into endpoint status through the hysteresis
//!   counters; emit log + metric only when status actually changes
//! - Deregister endpoints unhealthy beyond the configured grace period
//!
//! # Design Decisions
//! - Probe tasks answer a pool-owned stop signal (checker shutdown or
//!   endpoint removal), never a caller's cancellation
//! - Probe failures are handled entirely here; executor callers only ever
//!   observe them indirectly through endpoint status

use dashmap::DashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{HealthCheckConfig, ResiliencePolicies};
use crate::endpoints::{Endpoint, EndpointPool, EndpointStatus};
use crate::health::probe::Probe;
use crate::observability::metrics;

type TaskKey = (String, String);

struct ProbeTask {
    endpoint: Arc<Endpoint>,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Schedules active probes for every endpoint in the pool.
pub struct HealthChecker {
    pool: Arc<EndpointPool>,
    probe: Arc<dyn Probe>,
    policies: Arc<ResiliencePolicies>,
    tasks: Arc<DashMap<TaskKey, ProbeTask>>,
    shutdown: CancellationToken,
}

impl HealthChecker {
    pub fn new(
        pool: Arc<EndpointPool>,
        probe: Arc<dyn Probe>,
        policies: Arc<ResiliencePolicies>,
    ) -> Self {
        Self {
            pool,
            probe,
            policies,
            tasks: Arc::new(DashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Reconcile probe tasks against the pool's current endpoint set for
    /// `service`. Call after every discovery refresh.
    pub fn sync(&self, service: &str) {
        let config = self.policies.for_service(service).health_check.clone();
        let current = if config.enabled {
            self.pool.snapshot(service)
        } else {
            Vec::new()
        };

        // Stop tasks whose endpoint left the pool (or was re-created at a
        // new address: same id, different instance).
        self.tasks.retain(|(task_service, _), task| {
            if task_service != service {
                return true;
            }
            let still_pooled = current.iter().any(|ep| Arc::ptr_eq(ep, &task.endpoint));
            if !still_pooled {
                task.token.cancel();
            }
            still_pooled
        });

        for endpoint in current {
            let key = (service.to_string(), endpoint.id.clone());
            if !self.tasks.contains_key(&key) {
                let task = self.spawn_probe(service.to_string(), endpoint, config.clone());
                self.tasks.insert(key, task);
            }
        }
    }

    /// Number of endpoints currently being probed.
    pub fn active_probes(&self) -> usize {
        self.tasks.len()
    }

    /// Stop every probe task. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.tasks.retain(|_, task| {
            task.token.cancel();
            task.handle.abort();
            false
        });
        info!("health checker stopped");
    }

    fn spawn_probe(
        &self,
        service: String,
        endpoint: Arc<Endpoint>,
        config: HealthCheckConfig,
    ) -> ProbeTask {
        let token = self.shutdown.child_token();
        let task_token = token.clone();
        let probe = self.probe.clone();
        let pool = self.pool.clone();
        let tasks = self.tasks.clone();
        let ep = endpoint.clone();

        let handle = tokio::spawn(async move {
            let key = (service.clone(), ep.id.clone());
            let mut ticker = time::interval(config.interval());

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = task_token.cancelled() => break,
                }

                let verdict = time::timeout(config.timeout(), probe.check(&ep)).await;
                match verdict {
                    Ok(Ok(())) => {
                        ep.touch();
                        if ep.mark_success(config.healthy_threshold) {
                            info!(
                                service = %service,
                                endpoint = %ep.id,
                                authority = %ep.authority(),
                                "endpoint became healthy"
                            );
                            metrics::record_endpoint_health(&service, &ep.authority(), true);
                        }
                    }
                    Ok(Err(error)) => {
                        warn!(
                            service = %service,
                            endpoint = %ep.id,
                            authority = %ep.authority(),
                            error = %error,
                            "health probe failed"
                        );
                        if ep.mark_failure(config.unhealthy_threshold) {
                            warn!(
                                service = %service,
                                endpoint = %ep.id,
                                authority = %ep.authority(),
                                "endpoint became unhealthy"
                            );
                            metrics::record_endpoint_health(&service, &ep.authority(), false);
                        }
                    }
                    Err(_) => {
                        warn!(
                            service = %service,
                            endpoint = %ep.id,
                            authority = %ep.authority(),
                            timeout_secs = config.timeout_secs,
                            "health probe timed out"
                        );
                        if ep.mark_failure(config.unhealthy_threshold) {
                            warn!(
                                service = %service,
                                endpoint = %ep.id,
                                authority = %ep.authority(),
                                "endpoint became unhealthy"
                            );
                            metrics::record_endpoint_health(&service, &ep.authority(), false);
                        }
                    }
                }

                if ep.status() == EndpointStatus::Unhealthy
                    && ep.last_seen().elapsed() > config.deregister_after()
                {
                    pool.remove(&service, &ep.id);
                    info!(
                        service = %service,
                        endpoint = %ep.id,
                        authority = %ep.authority(),
                        "endpoint deregistered after prolonged unhealthiness"
                    );
                    break;
                }
            }

            // Only clear our own registration: a replacement task for the
            // same key may already be running (instance re-created at a new
            // address between our cancellation and exit).
            tasks.remove_if(&key, |_, task| Arc::ptr_eq(&task.endpoint, &ep));
        });

        ProbeTask {
            endpoint,
            token,
            handle,
        }
    }
}

impl Drop for HealthChecker {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
