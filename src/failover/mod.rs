//! Failover execution subsystem.
//!
//! # Data Flow
//! ```text
//! execute(service, operation)
//!     → pool.get_healthy (fail fast on empty)
//!     → strategy.rs (pure selection by attempt index)
//!     → breaker registry (admission + outcome accounting)
//!     → success: return | failure: wait retry_interval, next attempt
//!     → attempts exhausted: error wrapping the last failure
//! ```
//!
//! # Design Decisions
//! - Strategies are pure functions of (endpoints, attempt); no shared
//!   selection state between callers
//! - Caller cancellation is honored at every wait point
//! - Per-attempt outcomes are tagged by service and endpoint in metrics

pub mod executor;
pub mod strategy;

pub use executor::ResilientExecutor;
pub use strategy::FailoverStrategy;
