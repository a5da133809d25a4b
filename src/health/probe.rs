//! Probe capability contract.
//!
//! The communication layer supplies the actual liveness check (a TCP
//! connect, an HTTP GET, a protocol ping); this crate only schedules it
//! and folds the verdict into endpoint status.

use async_trait::async_trait;
use std::future::Future;

use crate::endpoints::Endpoint;
use crate::error::BoxError;

/// An active liveness check for one endpoint.
///
/// Any `Err` counts as one failure tick; the checker does not classify
/// probe errors further.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self, endpoint: &Endpoint) -> Result<(), BoxError>;
}

/// Adapter turning a closure into a [`Probe`].
///
/// The closure runs synchronously to capture whatever endpoint fields it
/// needs, then returns the future performing the check.
pub struct FnProbe<F>(F);

impl<F, Fut> FnProbe<F>
where
    F: Fn(&Endpoint) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> Probe for FnProbe<F>
where
    F: Fn(&Endpoint) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send,
{
    async fn check(&self, endpoint: &Endpoint) -> Result<(), BoxError> {
        (self.0)(endpoint).await
    }
}
