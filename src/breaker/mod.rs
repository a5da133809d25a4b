//! Circuit breaking subsystem.
//!
//! # Data Flow
//! ```text
//! Executor attempt
//!     → registry.rs (resolve breaker by dependency name)
//!     → circuit.rs (locked admission → unlocked call → locked record)
//!     → state.rs (Closed / Open / HalfOpen, stats snapshot)
//! ```
//!
//! # Design Decisions
//! - One breaker per dependency name; breakers never interact
//! - Open → HalfOpen is evaluated lazily on the admission path
//! - Every transition emits a structured log event and a metric

pub mod circuit;
pub mod registry;
pub mod state;

pub use circuit::CircuitBreaker;
pub use registry::BreakerRegistry;
pub use state::{BreakerStats, CircuitState};
