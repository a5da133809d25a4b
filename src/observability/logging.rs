//! Structured logging bootstrap.
//!
//! Transition events are emitted with `tracing` throughout the crate; this
//! helper wires a subscriber for embedding services that do not bring
//! their own.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize a fmt subscriber honoring `RUST_LOG`, defaulting to `info`
/// for this crate. Call at most once, from the composition root; services
/// with their own subscriber skip this entirely.
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resilience_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
