//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! embedding service's config loader (external)
//!     → schema.rs (serde deserialization, defaults)
//!     → validation.rs (semantic checks, all errors collected)
//!     → ResiliencePolicies (validated, immutable)
//!     → shared via Arc by the composition root
//! ```
//!
//! # Design Decisions
//! - This crate owns no on-disk format; loading is the embedding service's
//!   concern
//! - All fields have defaults so a minimal config is valid
//! - Validation separates syntactic (serde) from semantic checks and runs
//!   before a policy table is accepted by the executor

pub mod schema;
pub mod validation;

pub use schema::{
    BreakerConfig, FailoverConfig, HealthCheckConfig, ResilienceConfig, ResiliencePolicies,
};
pub use validation::{validate_config, validate_policies};
