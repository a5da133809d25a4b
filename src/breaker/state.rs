//! Breaker state and introspection snapshot.

use serde::{Deserialize, Serialize};

/// Circuit breaker state.
///
/// Transitions are strictly Closed → Open → HalfOpen → {Closed | Open};
/// the administrative `reset` re-enters Closed from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation, calls admitted.
    Closed,
    /// Dependency assumed down, calls rejected immediately.
    Open,
    /// Testing recovery, bounded trial calls admitted.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time snapshot of a breaker, consumed by the embedding service's
/// status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerStats {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    pub request_count: u32,
    /// Seconds since the last recorded failure, if any.
    pub seconds_since_last_failure: Option<u64>,
}
