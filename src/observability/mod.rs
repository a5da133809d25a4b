//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! breaker transitions / endpoint health flips / attempt outcomes
//!     → logging.rs (structured tracing events at the call sites)
//!     → metrics.rs (counters and gauges over the metrics facade)
//!
//! Consumers:
//!     → log aggregation (stdout, remote)
//!     → Prometheus scrape via init_metrics, or the embedder's recorder
//! ```
//!
//! # Design Decisions
//! - Only transitions are recorded, not every probe or admission check
//! - The metrics facade keeps this crate recorder-agnostic

pub mod logging;
pub mod metrics;
