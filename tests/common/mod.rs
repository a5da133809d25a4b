//! Shared helpers for the integration suites.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use resilience_core::{
    BreakerRegistry, EndpointPool, EndpointRecord, ResilienceConfig, ResiliencePolicies,
    ResilientExecutor,
};

/// Build a policy table from a tweaked default config.
pub fn policies_with(tweak: impl FnOnce(&mut ResilienceConfig)) -> Arc<ResiliencePolicies> {
    let mut config = ResilienceConfig::default();
    tweak(&mut config);
    Arc::new(ResiliencePolicies {
        default: config,
        services: HashMap::new(),
    })
}

/// Executor wired over a fresh registry and pool.
pub fn harness(
    policies: Arc<ResiliencePolicies>,
) -> (ResilientExecutor, Arc<EndpointPool>, Arc<BreakerRegistry>) {
    let pool = Arc::new(EndpointPool::new());
    let registry = Arc::new(BreakerRegistry::new());
    let executor = ResilientExecutor::new(registry.clone(), pool.clone(), policies)
        .expect("test policies must validate");
    (executor, pool, registry)
}

/// `count` endpoint records on distinct ports.
pub fn records(count: u16) -> Vec<EndpointRecord> {
    (0..count)
        .map(|i| EndpointRecord::new(format!("ep-{i}"), "127.0.0.1", 10_000 + i))
        .collect()
}

/// Poll `condition` until it holds or `deadline` passes.
pub async fn eventually(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let started = Instant::now();
    while started.elapsed() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    condition()
}
