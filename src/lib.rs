//! Resilience core shared by generated services.
//!
//! Guards calls to downstream dependencies (databases, caches, peer
//! services, brokers) with a circuit breaker per dependency and a
//! health-checked, failover-aware endpoint pool.
//!
//! # Architecture Overview
//!
//! ```text
//!   Discovery backend          ┌──────────────────────────────────────────┐
//!   (consensus store,          │              RESILIENCE CORE             │
//!    orchestrator API,         │                                          │
//!    static list)              │  ┌───────────┐      ┌────────────────┐   │
//!   ────────────────────────────▶│ discovery │─────▶│ endpoint pool  │   │
//!                               │  │  worker   │      │  (per service) │   │
//!                               │  └───────────┘      └───────┬────────┘   │
//!                               │                             │            │
//!                               │  ┌───────────┐              │ probes     │
//!   Probe capability ────────────▶│  health   │◀─────────────┘            │
//!   (communication layer)       │  │  checker  │  status flips             │
//!                               │  └───────────┘                           │
//!                               │                                          │
//!   execute(service, op)        │  ┌───────────────────┐  ┌────────────┐   │
//!   ────────────────────────────▶│ resilient executor │─▶│  breaker   │   │
//!                               │  │ (select + retry)  │  │  registry  │   │
//!   result / error              │  └───────────────────┘  └────────────┘   │
//!   ◀────────────────────────────                                          │
//!                               │  cross-cutting: config validation,       │
//!                               │  tracing events, metrics                 │
//!                               └──────────────────────────────────────────┘
//! ```
//!
//! All state is in-memory and process-scoped; nothing survives a restart.
//! The composition root builds the pieces once and shares them via `Arc`:
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use resilience_core::{
//!     BreakerRegistry, DiscoveryWorker, EndpointPool, FnProbe, HealthChecker,
//!     ResiliencePolicies, ResilientExecutor, StaticDiscovery,
//! };
//! use resilience_core::endpoints::EndpointRecord;
//!
//! # async fn compose() -> Result<(), Box<dyn std::error::Error>> {
//! let policies = Arc::new(ResiliencePolicies::default());
//! let pool = Arc::new(EndpointPool::new());
//! let registry = Arc::new(BreakerRegistry::new());
//!
//! let probe = Arc::new(FnProbe::new(|ep: &resilience_core::endpoints::Endpoint| {
//!     let authority = ep.authority();
//!     async move {
//!         // communication layer supplies the real liveness check
//!         let _ = authority;
//!         Ok(())
//!     }
//! }));
//! let checker = Arc::new(HealthChecker::new(pool.clone(), probe, policies.clone()));
//!
//! let discovery = Arc::new(StaticDiscovery::new().with_service(
//!     "orders-db",
//!     vec![EndpointRecord::new("primary", "10.0.0.1", 5432)],
//! ));
//! let worker = DiscoveryWorker::new(
//!     discovery,
//!     pool.clone(),
//!     checker.clone(),
//!     vec!["orders-db".into()],
//!     Duration::from_secs(30),
//! );
//! let stop = tokio_util::sync::CancellationToken::new();
//! tokio::spawn(worker.run(stop.clone()));
//!
//! let executor = ResilientExecutor::new(registry, pool, policies)?;
//! let row = executor
//!     .execute("orders-db", |endpoint| async move {
//!         // the protected call: a query, an RPC, an HTTP request
//!         Ok(format!("queried {}", endpoint.authority()))
//!     })
//!     .await?;
//! # let _ = row;
//! # stop.cancel();
//! # Ok(())
//! # }
//! ```

// Core subsystems
pub mod breaker;
pub mod config;
pub mod discovery;
pub mod endpoints;
pub mod failover;
pub mod health;

// Cross-cutting concerns
pub mod error;
pub mod observability;

pub use breaker::{BreakerRegistry, BreakerStats, CircuitBreaker, CircuitState};
pub use config::{ResilienceConfig, ResiliencePolicies};
pub use discovery::{Discovery, DiscoveryWorker, StaticDiscovery};
pub use endpoints::{Endpoint, EndpointPool, EndpointRecord, EndpointStatus};
pub use error::{BoxError, BreakerError, ConfigError, DiscoveryError, ExecuteError};
pub use failover::{FailoverStrategy, ResilientExecutor};
pub use health::{FnProbe, HealthChecker, Probe};
