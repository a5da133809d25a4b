//! Failover selection strategies.
//!
//! A strategy is a pure function `(endpoints, attempt) → endpoint` injected
//! via configuration. Round-robin rotates on the attempt index rather than
//! shared counter state, so concurrent callers cannot skew each other's
//! failover order.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::endpoints::Endpoint;

/// Endpoint selection strategy, named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FailoverStrategy {
    /// `endpoints[attempt % len]`: each retry moves to the next endpoint.
    #[default]
    RoundRobin,
    /// Uniformly random pick per attempt.
    Random,
    /// Always the first endpoint; alternates only exist as spares.
    First,
}

impl FailoverStrategy {
    /// Select an endpoint for the given attempt. `endpoints` must be
    /// non-empty; the executor fails fast on an empty pool before selection.
    pub fn select<'a>(&self, endpoints: &'a [Arc<Endpoint>], attempt: u32) -> &'a Arc<Endpoint> {
        match self {
            FailoverStrategy::RoundRobin => &endpoints[attempt as usize % endpoints.len()],
            FailoverStrategy::Random => {
                let idx = rand::thread_rng().gen_range(0..endpoints.len());
                &endpoints[idx]
            }
            FailoverStrategy::First => &endpoints[0],
        }
    }
}
