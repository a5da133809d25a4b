//! Configuration schema definitions.
//!
//! This module defines the per-service resilience policy surface. All types
//! derive Serde traits so the embedding service's config loader can
//! deserialize them from its own file format; no on-disk format is owned
//! here. Every field has a default so a minimal config is valid.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::failover::FailoverStrategy;

/// Per-service resilience policy bundle.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Circuit breaker thresholds.
    pub breaker: BreakerConfig,

    /// Active health checking settings.
    pub health_check: HealthCheckConfig,

    /// Endpoint selection and retry settings.
    pub failover: FailoverConfig,
}

/// Policy table consumed by the executor: a default policy plus per-service
/// overrides keyed by logical service name.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResiliencePolicies {
    /// Policy applied to services without an explicit entry.
    pub default: ResilienceConfig,

    /// Per-service overrides.
    pub services: HashMap<String, ResilienceConfig>,
}

impl ResiliencePolicies {
    /// Resolve the policy for a logical service name.
    pub fn for_service(&self, service: &str) -> &ResilienceConfig {
        self.services.get(service).unwrap_or(&self.default)
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Absolute failure count that opens the circuit.
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before admitting a trial call.
    pub timeout_secs: u64,

    /// Maximum in-flight trial calls while half-open.
    pub max_half_open_requests: u32,

    /// Successful trials required to close a half-open circuit.
    pub success_threshold: u32,

    /// Failure ratio (failures / requests) that opens the circuit.
    pub failure_ratio: f64,

    /// Minimum requests seen before either opening rule is evaluated.
    pub min_requests: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout_secs: 30,
            max_half_open_requests: 1,
            success_threshold: 2,
            failure_ratio: 0.5,
            min_requests: 3,
        }
    }
}

impl BreakerConfig {
    /// Open-state cool-down as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Active health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active probing. Disabled pools route on discovery data alone.
    pub enabled: bool,

    /// Probe interval in seconds.
    pub interval_secs: u64,

    /// Probe timeout in seconds.
    pub timeout_secs: u64,

    /// Seconds an endpoint may stay unhealthy with no sign of life before
    /// it is removed from the pool.
    pub deregister_after_secs: u64,

    /// Consecutive probe failures before marking unhealthy.
    pub unhealthy_threshold: u32,

    /// Consecutive probe successes before marking healthy.
    pub healthy_threshold: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
            timeout_secs: 5,
            deregister_after_secs: 120,
            unhealthy_threshold: 3,
            healthy_threshold: 2,
        }
    }
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn deregister_after(&self) -> Duration {
        Duration::from_secs(self.deregister_after_secs)
    }
}

/// Endpoint selection and retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FailoverConfig {
    /// Endpoint selection strategy.
    pub strategy: FailoverStrategy,

    /// Total attempts per `execute` call (first try included).
    pub max_retries: u32,

    /// Milliseconds to wait between attempts.
    pub retry_interval_ms: u64,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            strategy: FailoverStrategy::RoundRobin,
            max_retries: 3,
            retry_interval_ms: 200,
        }
    }
}

impl FailoverConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}
