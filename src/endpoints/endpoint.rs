//! Endpoint abstraction.
//!
//! # Responsibilities
//! - Represent one network-reachable instance of a logical dependency
//! - Track health status with hysteresis (consecutive-outcome counters)
//! - Remember when the instance last showed a sign of life

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use std::sync::RwLock;
use std::time::Instant;

/// Health status of an endpoint.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointStatus {
    /// Discovered but not yet probed. Routable.
    Unknown = 0,
    /// Probes passing. Routable.
    Healthy = 1,
    /// Probes failing. Excluded from selection.
    Unhealthy = 2,
}

impl From<u8> for EndpointStatus {
    fn from(val: u8) -> Self {
        match val {
            1 => EndpointStatus::Healthy,
            2 => EndpointStatus::Unhealthy,
            _ => EndpointStatus::Unknown,
        }
    }
}

impl std::fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EndpointStatus::Unknown => "unknown",
            EndpointStatus::Healthy => "healthy",
            EndpointStatus::Unhealthy => "unhealthy",
        };
        f.write_str(s)
    }
}

/// Plain endpoint data as reported by a discovery backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRecord {
    /// Instance identifier, unique within its logical service.
    pub id: String,
    /// Host or IP.
    pub address: String,
    pub port: u16,
    /// Free-form tags (zone, version, weight hints).
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl EndpointRecord {
    pub fn new(id: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            port,
            metadata: HashMap::new(),
        }
    }
}

/// A live endpoint in the pool.
///
/// Identity fields are immutable; status and metadata are refined in place
/// so pooled references observe probe results without replacement. Status
/// is mutated only by the health checker.
#[derive(Debug)]
pub struct Endpoint {
    pub id: String,
    pub address: String,
    pub port: u16,
    metadata: RwLock<HashMap<String, String>>,
    status: AtomicU8,
    consecutive_failures: AtomicU32,
    consecutive_successes: AtomicU32,
    last_seen: RwLock<Instant>,
}

impl Endpoint {
    pub fn new(record: EndpointRecord) -> Self {
        Self {
            id: record.id,
            address: record.address,
            port: record.port,
            metadata: RwLock::new(record.metadata),
            status: AtomicU8::new(EndpointStatus::Unknown as u8),
            consecutive_failures: AtomicU32::new(0),
            consecutive_successes: AtomicU32::new(0),
            last_seen: RwLock::new(Instant::now()),
        }
    }

    /// `host:port` form used in logs and metric labels.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn status(&self) -> EndpointStatus {
        EndpointStatus::from(self.status.load(Ordering::Relaxed))
    }

    /// True unless the most recently recorded status is Unhealthy. Unknown
    /// endpoints stay routable until their first probe verdict.
    pub fn is_routable(&self) -> bool {
        self.status() != EndpointStatus::Unhealthy
    }

    pub fn metadata(&self) -> HashMap<String, String> {
        self.metadata.read().unwrap().clone()
    }

    /// Replace metadata from a fresh discovery report.
    pub fn update_metadata(&self, metadata: HashMap<String, String>) {
        *self.metadata.write().unwrap() = metadata;
    }

    /// Record a sign of life (discovery report or passing probe).
    pub fn touch(&self) {
        *self.last_seen.write().unwrap() = Instant::now();
    }

    pub fn last_seen(&self) -> Instant {
        *self.last_seen.read().unwrap()
    }

    /// Record a passing probe. Returns true when this flips the status to
    /// Healthy (the `healthy_threshold`-th consecutive success).
    pub fn mark_success(&self, healthy_threshold: u32) -> bool {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;

        if self.status() == EndpointStatus::Healthy {
            return false;
        }
        if successes >= healthy_threshold {
            self.status.store(EndpointStatus::Healthy as u8, Ordering::Relaxed);
            self.consecutive_successes.store(0, Ordering::Relaxed);
            return true;
        }
        false
    }

    /// Record a failing probe. Returns true when this flips the status to
    /// Unhealthy (the `unhealthy_threshold`-th consecutive failure).
    pub fn mark_failure(&self, unhealthy_threshold: u32) -> bool {
        self.consecutive_successes.store(0, Ordering::Relaxed);
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;

        if self.status() == EndpointStatus::Unhealthy {
            return false;
        }
        if failures >= unhealthy_threshold {
            self.status.store(EndpointStatus::Unhealthy as u8, Ordering::Relaxed);
            self.consecutive_failures.store(0, Ordering::Relaxed);
            return true;
        }
        false
    }
}
