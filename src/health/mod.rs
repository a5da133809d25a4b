//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! checker.rs:
//!     one periodic task per pooled endpoint
//!     → probe.rs (caller-supplied liveness check, bounded by timeout)
//!     → endpoint hysteresis counters (consecutive successes/failures)
//!     → status flip → transition log + metric
//!     → unhealthy past deregister_after → removed from the pool
//! ```
//!
//! # Design Decisions
//! - Status transitions require consecutive successes/failures, which
//!   prevents flapping on a single bad probe
//! - Probe tasks stop on the pool-owned signal, not caller cancellation
//! - Probe failures never surface to executor callers

pub mod checker;
pub mod probe;

pub use checker::HealthChecker;
pub use probe::{FnProbe, Probe};
