//! Named breaker registry.
//!
//! # Responsibilities
//! - Lazily create one breaker per dependency name
//! - Survive concurrent first access without duplicate construction
//! - Expose the whole fleet for the status surface and admin reset
//!
//! # Design Decisions
//! - Explicit object owned by the composition root and shared via `Arc`;
//!   never process-global state
//! - Read lock fast path, write lock + re-check slow path: concurrent
//!   first callers construct exactly one breaker

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use crate::breaker::circuit::CircuitBreaker;
use crate::breaker::state::BreakerStats;
use crate::config::BreakerConfig;
use crate::error::{BoxError, BreakerError};

/// Hands out named [`CircuitBreaker`] instances, creating them on first use.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the breaker for `name`, creating it from `config` on first use.
    ///
    /// `config` is only consulted when the breaker does not exist yet; an
    /// existing breaker keeps the configuration it was born with.
    pub fn get_or_create(&self, name: &str, config: &BreakerConfig) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.breakers.read().unwrap().get(name) {
            return breaker.clone();
        }

        let mut breakers = self.breakers.write().unwrap();
        // Re-check under the write lock: another caller may have won the race
        // between our read and write acquisitions.
        if let Some(breaker) = breakers.get(name) {
            return breaker.clone();
        }
        let breaker = Arc::new(CircuitBreaker::new(name, config.clone()));
        breakers.insert(name.to_string(), breaker.clone());
        breaker
    }

    /// Fetch an existing breaker without creating one.
    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.read().unwrap().get(name).cloned()
    }

    /// Convenience pass-through to the named breaker's `execute`.
    pub async fn execute<T, F, Fut>(
        &self,
        name: &str,
        config: &BreakerConfig,
        operation: F,
    ) -> Result<T, BreakerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, BoxError>>,
    {
        self.get_or_create(name, config).execute(operation).await
    }

    /// Force every registered breaker back to Closed.
    pub fn reset_all(&self) {
        let breakers = self.breakers.read().unwrap();
        for breaker in breakers.values() {
            breaker.reset();
        }
    }

    /// Snapshot of every registered breaker for the status surface.
    pub fn stats(&self) -> Vec<BreakerStats> {
        let breakers = self.breakers.read().unwrap();
        let mut stats: Vec<_> = breakers.values().map(|b| b.stats()).collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }
}
