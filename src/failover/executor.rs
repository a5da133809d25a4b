//! Resilient execution.
//!
//! # Responsibilities
//! - Compose breaker admission, endpoint selection and bounded retries
//!   into one entrypoint for protected calls
//! - Fail fast when the pool has nothing routable
//! - Honor caller cancellation between and during attempts
//!
//! # Design Decisions
//! - The operation receives the selected endpoint and returns an opaque
//!   result; this crate never touches the wire
//! - An empty healthy set is fatal for the whole call: retrying against an
//!   empty pool cannot succeed
//! - The retry wait blocks only the calling task

use std::future::Future;
use std::sync::Arc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::breaker::{BreakerRegistry, BreakerStats, CircuitState};
use crate::config::{validate_policies, ResiliencePolicies};
use crate::endpoints::{Endpoint, EndpointPool};
use crate::error::{BoxError, ConfigError, ExecuteError};
use crate::observability::metrics;

/// Primary entrypoint: executes caller operations against healthy
/// endpoints under breaker admission, failing over across alternates.
pub struct ResilientExecutor {
    registry: Arc<BreakerRegistry>,
    pool: Arc<EndpointPool>,
    policies: Arc<ResiliencePolicies>,
}

impl ResilientExecutor {
    /// Build an executor over a breaker registry and endpoint pool.
    ///
    /// The whole policy table is validated here: malformed configuration
    /// fails service startup, not the call path.
    pub fn new(
        registry: Arc<BreakerRegistry>,
        pool: Arc<EndpointPool>,
        policies: Arc<ResiliencePolicies>,
    ) -> Result<Self, ConfigError> {
        validate_policies(&policies)?;
        Ok(Self {
            registry,
            pool,
            policies,
        })
    }

    /// Execute `operation` against a healthy endpoint of `service`,
    /// retrying across alternates per the service's failover policy.
    pub async fn execute<T, F, Fut>(&self, service: &str, operation: F) -> Result<T, ExecuteError>
    where
        F: Fn(Arc<Endpoint>) -> Fut,
        Fut: Future<Output = Result<T, BoxError>>,
    {
        let never = CancellationToken::new();
        self.execute_cancellable(service, operation, &never).await
    }

    /// [`execute`](Self::execute) with a caller-supplied cancellation
    /// signal. Firing mid-attempt abandons the wait and returns
    /// [`ExecuteError::Cancelled`].
    pub async fn execute_cancellable<T, F, Fut>(
        &self,
        service: &str,
        operation: F,
        cancel: &CancellationToken,
    ) -> Result<T, ExecuteError>
    where
        F: Fn(Arc<Endpoint>) -> Fut,
        Fut: Future<Output = Result<T, BoxError>>,
    {
        let policy = self.policies.for_service(service);
        let max_retries = policy.failover.max_retries;
        let retry_interval = policy.failover.retry_interval();
        let mut last_error = None;

        for attempt in 0..max_retries {
            if cancel.is_cancelled() {
                return Err(ExecuteError::Cancelled {
                    service: service.to_string(),
                });
            }

            let healthy = self.pool.get_healthy(service);
            if healthy.is_empty() {
                warn!(service = %service, attempt, "no healthy endpoints, failing fast");
                return Err(ExecuteError::NoHealthyEndpoints {
                    service: service.to_string(),
                });
            }

            let endpoint = policy.failover.strategy.select(&healthy, attempt).clone();
            debug!(
                service = %service,
                endpoint = %endpoint.id,
                authority = %endpoint.authority(),
                attempt,
                "dispatching attempt"
            );

            let attempt_result = tokio::select! {
                result = self.registry.execute(service, &policy.breaker, || {
                    operation(endpoint.clone())
                }) => result,
                _ = cancel.cancelled() => {
                    return Err(ExecuteError::Cancelled {
                        service: service.to_string(),
                    });
                }
            };

            match attempt_result {
                Ok(value) => {
                    metrics::record_attempt(service, &endpoint.authority(), true);
                    return Ok(value);
                }
                Err(error) => {
                    metrics::record_attempt(service, &endpoint.authority(), false);
                    warn!(
                        service = %service,
                        endpoint = %endpoint.id,
                        attempt,
                        error = %error,
                        "attempt failed"
                    );
                    last_error = Some(error);

                    if attempt + 1 < max_retries {
                        tokio::select! {
                            _ = time::sleep(retry_interval) => {}
                            _ = cancel.cancelled() => {
                                return Err(ExecuteError::Cancelled {
                                    service: service.to_string(),
                                });
                            }
                        }
                    }
                }
            }
        }

        Err(ExecuteError::Exhausted {
            service: service.to_string(),
            attempts: max_retries,
            last: last_error.expect("max_retries is validated positive"),
        })
    }

    /// Current breaker state for a service, if its breaker exists yet.
    pub fn breaker_state(&self, service: &str) -> Option<CircuitState> {
        self.registry.get(service).map(|b| b.state())
    }

    /// Breaker counters for a service, if its breaker exists yet.
    pub fn breaker_stats(&self, service: &str) -> Option<BreakerStats> {
        self.registry.get(service).map(|b| b.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResilienceConfig;
    use crate::endpoints::EndpointRecord;
    use crate::failover::FailoverStrategy;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast_policies(max_retries: u32) -> Arc<ResiliencePolicies> {
        let mut config = ResilienceConfig::default();
        config.failover.max_retries = max_retries;
        config.failover.retry_interval_ms = 10;
        config.failover.strategy = FailoverStrategy::RoundRobin;
        // keep the breaker out of the way unless a test wants it
        config.breaker.failure_threshold = 100;
        config.breaker.min_requests = 100;
        Arc::new(ResiliencePolicies {
            default: config,
            services: Default::default(),
        })
    }

    fn executor(policies: Arc<ResiliencePolicies>) -> (ResilientExecutor, Arc<EndpointPool>) {
        let pool = Arc::new(EndpointPool::new());
        let exec = ResilientExecutor::new(
            Arc::new(BreakerRegistry::new()),
            pool.clone(),
            policies,
        )
        .unwrap();
        (exec, pool)
    }

    #[tokio::test]
    async fn empty_pool_fails_fast_with_zero_invocations() {
        let (exec, _pool) = executor(fast_policies(3));
        let invocations = Arc::new(AtomicU32::new(0));
        let seen = invocations.clone();

        let err = exec
            .execute("db", move |_ep| {
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
    async fn invalid_policy_table_fails_construction() {
        let mut policies = ResiliencePolicies::default();
        policies.default.failover.max_retries = 0;
        let result = ResilientExecutor::new(
            Arc::new(BreakerRegistry::new()),
            Arc::new(EndpointPool::new()),
            Arc::new(policies),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn cancellation_interrupts_retry_wait() {
        let mut policies = ResiliencePolicies::default();
        let config = &mut policies.default;
        config.failover.max_retries = 3;
        config.failover.retry_interval_ms = 60_000;
        config.breaker.failure_threshold = 100;
        config.breaker.min_requests = 100;
        let (exec, pool) = executor(Arc::new(policies));
        pool.refresh("db", vec![EndpointRecord::new("a", "10.0.0.1", 1)]);

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let started = std::time::Instant::now();
        let err = exec
            .execute_cancellable(
                "db",
                |_ep| async { Err::<(), _>("always failing".into()) },
                &cancel,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ExecuteError::Cancelled { .. }));
        // must not have sat out the 60s retry interval
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
