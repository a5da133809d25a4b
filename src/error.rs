//! Error taxonomy for the resilience core.
//!
//! # Design Decisions
//! - Breaker-level and executor-level failures are separate enums: the
//!   executor wraps the last breaker failure when attempts run out
//! - Admission rejection (`BreakerError::Open`) is distinct from the
//!   protected operation's own failure (`BreakerError::Operation`)
//! - Caller-supplied operations fail with an opaque boxed error; this crate
//!   never inspects it beyond counting the outcome

use std::time::Duration;
use thiserror::Error;

/// Opaque error produced by caller-supplied operations and probes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures surfaced by a single breaker-guarded call.
#[derive(Debug, Error)]
pub enum BreakerError {
    /// Admission denied; the operation was never invoked.
    #[error("circuit '{name}' is open")]
    Open {
        /// Breaker name the rejection came from.
        name: String,
        /// Time remaining until the breaker will admit a trial call, if known.
        retry_after: Option<Duration>,
    },

    /// The protected operation itself failed. Counted toward breaker
    /// statistics, then propagated.
    #[error("protected operation failed")]
    Operation(#[source] BoxError),
}

impl BreakerError {
    /// True if this is an admission rejection rather than an operation failure.
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open { .. })
    }
}

/// Failures surfaced by `ResilientExecutor::execute`.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The pool held no routable endpoint for the service. Fatal for the
    /// whole call; retrying against an empty pool is pointless.
    #[error("no healthy endpoints available for service '{service}'")]
    NoHealthyEndpoints { service: String },

    /// Every attempt failed; wraps the last failure observed.
    #[error("all {attempts} attempts against service '{service}' failed")]
    Exhausted {
        service: String,
        attempts: u32,
        #[source]
        last: BreakerError,
    },

    /// The caller's cancellation signal fired mid-attempt.
    #[error("execution against service '{service}' cancelled by caller")]
    Cancelled { service: String },
}

/// Failures surfaced by discovery implementations.
///
/// The discovery worker logs these and keeps the previous endpoint set;
/// they never reach executor callers.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("discovery backend unavailable: {0}")]
    Unavailable(String),

    #[error("discovery fetch failed")]
    Fetch(#[source] BoxError),
}

/// A single semantic violation found while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {problem}")]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `breaker.failure_ratio`.
    pub field: String,
    pub problem: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            problem: problem.into(),
        }
    }
}

/// Configuration rejected at construction time.
///
/// Carries every violation found, not just the first, so a service fails
/// startup with the full list.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid resilience configuration: {}", format_violations(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_violations(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
