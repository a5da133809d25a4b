//! Endpoint pool subsystem.
//!
//! # Data Flow
//! ```text
//! Discovery report (Vec<EndpointRecord>)
//!     → pool.rs refresh (merge, preserve health state, compute delta)
//!     → endpoint.rs (status + hysteresis counters, mutated by the
//!       health checker)
//!     → get_healthy snapshots consumed by the executor
//! ```
//!
//! # Design Decisions
//! - Health state is per-endpoint, not per-pool
//! - Pool readers and probe writers run concurrently; status lives in
//!   atomics on the endpoint itself

pub mod endpoint;
pub mod pool;

pub use endpoint::{Endpoint, EndpointRecord, EndpointStatus};
pub use pool::{EndpointPool, RefreshDelta};
