//! Circuit breaker state machine.
//!
//! # States
//! - Closed: calls pass through; outcomes feed the failure accounting
//! - Open: dependency assumed down, calls rejected without being invoked
//! - HalfOpen: bounded trial calls test whether the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open:      request_count >= min_requests AND
//!                     (failure_count >= failure_threshold OR
//!                      failure_count / request_count >= failure_ratio)
//! Open → HalfOpen:    timeout elapsed since last failure, evaluated lazily
//!                     on the next admission attempt (no timer task)
//! HalfOpen → Closed:  success_threshold trial successes
//! HalfOpen → Open:    any trial failure
//! ```
//!
//! # Design Decisions
//! - The lock protects admission and recording only; the awaited operation
//!   runs unlocked, so one slow call cannot serialize a breaker's traffic
//! - Trial permits carry the half-open generation they were issued under;
//!   outcomes from a superseded generation are dropped, not double-counted
//! - An abandoned trial (future dropped mid-flight) releases its slot

use std::future::Future;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{info, warn};

use crate::breaker::state::{BreakerStats, CircuitState};
use crate::config::BreakerConfig;
use crate::error::{BoxError, BreakerError};
use crate::observability::metrics;

/// Mutable breaker core, guarded by a single mutex.
#[derive(Debug)]
struct Core {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    request_count: u32,
    /// Trial calls currently in flight while half-open.
    half_open_in_flight: u32,
    /// Bumped on every entry into HalfOpen; stale trial outcomes are
    /// recognized by a generation mismatch.
    half_open_generation: u64,
    last_failure: Option<Instant>,
}

impl Core {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            request_count: 0,
            half_open_in_flight: 0,
            half_open_generation: 0,
            last_failure: None,
        }
    }

    fn should_open(&self, config: &BreakerConfig) -> bool {
        if self.request_count < config.min_requests {
            return false;
        }
        if self.failure_count >= config.failure_threshold {
            return true;
        }
        f64::from(self.failure_count) / f64::from(self.request_count) >= config.failure_ratio
    }
}

/// Per-dependency circuit breaker.
///
/// Owned by [`BreakerRegistry`](crate::breaker::BreakerRegistry); lives for
/// the process lifetime once created.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    core: Mutex<Core>,
}

/// Admission token returned by the locked admission check. Recording an
/// outcome consumes it; dropping it unconsumed releases a half-open slot.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    kind: PermitKind,
    recorded: bool,
}

#[derive(Clone, Copy)]
enum PermitKind {
    Closed,
    Trial { generation: u64 },
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.recorded {
            return;
        }
        if let PermitKind::Trial { generation } = self.kind {
            let mut core = self.breaker.core.lock().unwrap();
            if core.state == CircuitState::HalfOpen && core.half_open_generation == generation {
                core.half_open_in_flight = core.half_open_in_flight.saturating_sub(1);
            }
        }
    }
}

impl CircuitBreaker {
    /// Create a breaker from a validated configuration.
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        let name = name.into();
        info!(circuit = %name, "circuit breaker created");
        Self {
            name,
            config,
            core: Mutex::new(Core::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state as last recorded. The Open → HalfOpen move happens on
    /// the admission path, so an expired Open circuit still reads Open here
    /// until the next call attempt.
    pub fn state(&self) -> CircuitState {
        self.core.lock().unwrap().state
    }

    /// Run `operation` under this breaker's admission control.
    ///
    /// Rejected calls return [`BreakerError::Open`] without invoking the
    /// operation; invoked operations have their outcome recorded and any
    /// failure propagated as [`BreakerError::Operation`].
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, BreakerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, BoxError>>,
    {
        let permit = self.try_acquire()?;
        match operation().await {
            Ok(value) => {
                self.record(permit, true);
                Ok(value)
            }
            Err(source) => {
                self.record(permit, false);
                Err(BreakerError::Operation(source))
            }
        }
    }

    /// Administrative override: force Closed with zeroed counters.
    pub fn reset(&self) {
        let mut core = self.core.lock().unwrap();
        let from = core.state;
        self.transition(&mut core, CircuitState::Closed);
        core.last_failure = None;
        drop(core);
        info!(circuit = %self.name, from = %from, "circuit breaker reset");
    }

    /// Snapshot of the breaker's counters for the status surface.
    pub fn stats(&self) -> BreakerStats {
        let core = self.core.lock().unwrap();
        BreakerStats {
            name: self.name.clone(),
            state: core.state,
            failure_count: core.failure_count,
            success_count: core.success_count,
            request_count: core.request_count,
            seconds_since_last_failure: core.last_failure.map(|t| t.elapsed().as_secs()),
        }
    }

    /// Locked admission decision. Fast: no awaits, no I/O.
    fn try_acquire(&self) -> Result<Permit<'_>, BreakerError> {
        let mut core = self.core.lock().unwrap();
        match core.state {
            CircuitState::Closed => Ok(Permit {
                breaker: self,
                kind: PermitKind::Closed,
                recorded: false,
            }),
            CircuitState::Open => {
                let elapsed = core.last_failure.map(|t| t.elapsed());
                let expired = elapsed.map_or(true, |e| e >= self.config.timeout());
                if !expired {
                    let retry_after = elapsed.map(|e| self.config.timeout().saturating_sub(e));
                    metrics::record_breaker_rejection(&self.name);
                    return Err(BreakerError::Open {
                        name: self.name.clone(),
                        retry_after,
                    });
                }
                // Cool-down over: this call becomes the first trial.
                self.transition(&mut core, CircuitState::HalfOpen);
                core.half_open_in_flight = 1;
                Ok(Permit {
                    breaker: self,
                    kind: PermitKind::Trial {
                        generation: core.half_open_generation,
                    },
                    recorded: false,
                })
            }
            CircuitState::HalfOpen => {
                if core.half_open_in_flight >= self.config.max_half_open_requests {
                    metrics::record_breaker_rejection(&self.name);
                    return Err(BreakerError::Open {
                        name: self.name.clone(),
                        retry_after: None,
                    });
                }
                core.half_open_in_flight += 1;
                Ok(Permit {
                    breaker: self,
                    kind: PermitKind::Trial {
                        generation: core.half_open_generation,
                    },
                    recorded: false,
                })
            }
        }
    }

    /// Locked outcome recording. Outcomes whose permit predates a state
    /// transition are dropped; counters may understate under races but
    /// never double-count, and an Open circuit cannot re-open.
    fn record(&self, mut permit: Permit<'_>, success: bool) {
        permit.recorded = true;
        let kind = permit.kind;
        drop(permit);

        let mut core = self.core.lock().unwrap();
        match kind {
            PermitKind::Trial { generation } => {
                if core.state != CircuitState::HalfOpen
                    || core.half_open_generation != generation
                {
                    return;
                }
                core.half_open_in_flight = core.half_open_in_flight.saturating_sub(1);
                core.request_count += 1;
                if success {
                    core.success_count += 1;
                    if core.success_count >= self.config.success_threshold {
                        self.transition(&mut core, CircuitState::Closed);
                        drop(core);
                        info!(circuit = %self.name, "circuit closed, dependency recovered");
                    }
                } else {
                    core.failure_count += 1;
                    self.transition(&mut core, CircuitState::Open);
                    drop(core);
                    warn!(circuit = %self.name, "circuit reopened, recovery trial failed");
                }
            }
            PermitKind::Closed => {
                if core.state != CircuitState::Closed {
                    return;
                }
                core.request_count += 1;
                if success {
                    core.success_count += 1;
                } else {
                    core.failure_count += 1;
                    core.last_failure = Some(Instant::now());
                }
                if core.should_open(&self.config) {
                    let failures = core.failure_count;
                    let requests = core.request_count;
                    self.transition(&mut core, CircuitState::Open);
                    drop(core);
                    warn!(
                        circuit = %self.name,
                        failures,
                        requests,
                        "circuit opened, failure accounting tripped"
                    );
                }
            }
        }
    }

    /// Apply a state change and its entry actions. Caller holds the lock.
    fn transition(&self, core: &mut Core, to: CircuitState) {
        let from = core.state;
        core.state = to;
        match to {
            CircuitState::Closed | CircuitState::HalfOpen => {
                core.failure_count = 0;
                core.success_count = 0;
                core.request_count = 0;
                core.half_open_in_flight = 0;
                if to == CircuitState::HalfOpen {
                    core.half_open_generation += 1;
                }
            }
            CircuitState::Open => {
                core.last_failure = Some(Instant::now());
            }
        }
        if from != to {
            metrics::record_breaker_transition(&self.name, from, to);
            info!(circuit = %self.name, from = %from, to = %to, "circuit state transition");
        }
    }
}
