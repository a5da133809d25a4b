//! Failover behavior: selection across alternates, bounded retries,
//! fail-fast on an empty pool.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use resilience_core::{
    BoxError, BreakerError, ExecuteError, FailoverStrategy, ResilienceConfig, ResiliencePolicies,
};

mod common;

#[tokio::test]
async fn round_robin_fails_over_to_healthy_alternate() {
    let policies = common::policies_with(|config| {
        config.failover.strategy = FailoverStrategy::RoundRobin;
        config.failover.max_retries = 2;
        config.failover.retry_interval_ms = 10;
        // breaker must not interfere with this scenario
        config.breaker.failure_threshold = 100;
        config.breaker.min_requests = 100;
    });
    let (executor, pool, _registry) = common::harness(policies);
    pool.refresh("api", common::records(2));

    let per_endpoint: Arc<std::sync::Mutex<HashMap<String, u32>>> = Default::default();
    let seen = per_endpoint.clone();

    // endpoint ep-0 always fails, ep-1 always succeeds
    let result = executor
        .execute("api", move |ep| {
            let seen = seen.clone();
            async move {
                *seen.lock().unwrap().entry(ep.id.clone()).or_default() += 1;
                if ep.id == "ep-0" {
                    Err::<String, BoxError>("refused".into())
                } else {
                    Ok(format!("served by {}", ep.id))
                }
            }
        })
        .await
        .expect("second attempt should land on the healthy endpoint");

    assert_eq!(result, "served by ep-1");
    let counts = per_endpoint.lock().unwrap().clone();
    assert_eq!(counts.get("ep-0"), Some(&1));
    assert_eq!(counts.get("ep-1"), Some(&1));
}

#[tokio::test]
async fn exhaustion_is_bounded_and_wraps_last_failure() {
    let policies = common::policies_with(|config| {
        config.failover.max_retries = 3;
        config.failover.retry_interval_ms = 10;
        config.breaker.failure_threshold = 100;
        config.breaker.min_requests = 100;
    });
    let (executor, pool, _registry) = common::harness(policies);
    pool.refresh("api", common::records(2));

    let invocations = Arc::new(AtomicU32::new(0));
    let seen = invocations.clone();

    let err = executor
        .execute("api", move |_ep| {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Err::<(), BoxError>("everything is on fire".into())
            }
        })
        .await
        .unwrap_err();

    assert_eq!(invocations.load(Ordering::SeqCst), 3);
    match err {
        ExecuteError::Exhausted {
            attempts, last, ..
        } => {
            assert_eq!(attempts, 3);
            match last {
                BreakerError::Operation(source) => {
                    assert_eq!(source.to_string(), "everything is on fire")
                }
                other => panic!("expected Operation, got {other:?}"),
            }
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_pool_fails_fast_without_invoking() {
    let policies = common::policies_with(|config| {
        config.failover.max_retries = 3;
    });
    let (executor, _pool, _registry) = common::harness(policies);

    let invocations = Arc::new(AtomicU32::new(0));
    let seen = invocations.clone();

    let err = executor
        .execute("ghost-service", move |_ep| {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxError>(())
            }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ExecuteError::NoHealthyEndpoints { .. }));
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unhealthy_endpoints_are_never_selected() {
    let policies = common::policies_with(|config| {
        config.failover.strategy = FailoverStrategy::First;
        config.failover.max_retries = 1;
        config.health_check.unhealthy_threshold = 1;
    });
    let (executor, pool, _registry) = common::harness(policies);
    pool.refresh("api", common::records(2));

    // knock out ep-0 the way the health checker would
    let ep0 = pool.snapshot("api")[0].clone();
    ep0.mark_failure(1);
    assert!(!ep0.is_routable());

    for _ in 0..5 {
        let served = executor
            .execute("api", |ep| async move { Ok::<_, BoxError>(ep.id.clone()) })
            .await
            .unwrap();
        assert_eq!(served, "ep-1");
    }
}

#[tokio::test]
async fn per_service_policy_overrides_apply() {
    let mut default = ResilienceConfig::default();
    default.failover.max_retries = 1;
    default.breaker.failure_threshold = 100;
    default.breaker.min_requests = 100;

    let mut tight = default.clone();
    tight.failover.max_retries = 4;
    tight.failover.retry_interval_ms = 10;

    let mut services = HashMap::new();
    services.insert("flaky-api".to_string(), tight);
    let policies = Arc::new(ResiliencePolicies {
        default,
        services,
    });

    let (executor, pool, _registry) = common::harness(policies);
    pool.refresh("flaky-api", common::records(1));

    let invocations = Arc::new(AtomicU32::new(0));
    let seen = invocations.clone();
    let _ = executor
        .execute("flaky-api", move |_ep| {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Err::<(), BoxError>("flaky".into())
            }
        })
        .await;

    // the override's four attempts, not the default's one
    assert_eq!(invocations.load(Ordering::SeqCst), 4);
}
