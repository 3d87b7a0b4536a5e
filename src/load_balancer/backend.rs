//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single instance of a logical service
//! - Track active connections (for Least Connections LB)
//! - Enforce max connection limits
//! - Track health state (Healthy/Unhealthy)

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use url::Url;

use crate::health::state::HealthState;

/// Process-wide reference point for failure timestamps.
fn epoch() -> Instant {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    *EPOCH.get_or_init(Instant::now)
}

fn now_micros() -> u64 {
    epoch().elapsed().as_micros() as u64
}

/// A single service instance.
#[derive(Debug)]
pub struct Backend {
    /// Logical service this instance belongs to.
    pub service: String,
    /// Base URL of the instance; only scheme and authority are used.
    pub base_url: Url,
    /// `host:port`, pre-computed for request URIs and labels.
    pub authority: String,
    /// Maximum concurrent connections allowed.
    pub max_connections: usize,
    /// Number of currently active connections.
    pub active_connections: AtomicUsize,

    /// Current health state (0=Unknown, 1=Healthy, 2=Unhealthy).
    pub state: AtomicU8,
    /// Consecutive failure count.
    pub consecutive_failures: AtomicUsize,
    /// Consecutive success count.
    pub consecutive_successes: AtomicUsize,
    /// Time of the last reported failure, in microseconds since the
    /// process epoch (0 = never failed).
    pub last_failure: AtomicU64,
}

impl Backend {
    /// Create a new backend from an instance URL such as `http://10.0.0.5:8081`.
    pub fn new(service: impl Into<String>, url: &str, max_connections: usize) -> Result<Self, url::ParseError> {
        let base_url = Url::parse(url)?;
        let host = base_url.host_str().ok_or(url::ParseError::EmptyHost)?;
        let authority = match base_url.port_or_known_default() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            service: service.into(),
            base_url,
            authority,
            max_connections,
            active_connections: AtomicUsize::new(0),
            state: AtomicU8::new(HealthState::Unknown as u8),
            consecutive_failures: AtomicUsize::new(0),
            consecutive_successes: AtomicUsize::new(0),
            last_failure: AtomicU64::new(0),
        })
    }

    /// Get the current number of active connections.
    pub fn connection_count(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Increment active connection count.
    pub fn inc_connections(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement active connection count.
    pub fn dec_connections(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    /// True if the backend is below its connection cap.
    pub fn has_capacity(&self) -> bool {
        self.connection_count() < self.max_connections
    }

    /// True if the backend is healthy and below its connection cap.
    pub fn is_available(&self) -> bool {
        self.is_healthy() && self.has_capacity()
    }

    /// Try to create a connection guard that increments count.
    pub fn try_create_guard(self: &Arc<Self>) -> Option<BackendConnectionGuard> {
        let mut prev = self.active_connections.load(Ordering::Relaxed);
        loop {
            if prev >= self.max_connections {
                return None;
            }
            match self.active_connections.compare_exchange_weak(
                prev,
                prev + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => prev = x,
            }
        }
        Some(BackendConnectionGuard {
            backend: self.clone(),
        })
    }

    /// When the backend last failed; `None` if it never did.
    pub fn last_failure(&self) -> Option<u64> {
        match self.last_failure.load(Ordering::Relaxed) {
            0 => None,
            t => Some(t),
        }
    }

    // --- Health Logic ---

    /// Current health state.
    pub fn health(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Relaxed))
    }

    /// Return true if backend is considered healthy (Healthy or Unknown).
    pub fn is_healthy(&self) -> bool {
        self.health() != HealthState::Unhealthy
    }

    /// Report a successful request/check.
    pub fn mark_success(&self, healthy_threshold: usize) {
        self.consecutive_failures.store(0, Ordering::Relaxed);

        if self.health() == HealthState::Healthy {
            return;
        }

        let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= healthy_threshold {
            self.state.store(HealthState::Healthy as u8, Ordering::Relaxed);
            self.consecutive_successes.store(0, Ordering::Relaxed);
        }
    }

    /// Report a failed request/check.
    pub fn mark_failure(&self, unhealthy_threshold: usize) {
        self.consecutive_successes.store(0, Ordering::Relaxed);
        self.last_failure.store(now_micros().max(1), Ordering::Relaxed);

        if self.health() == HealthState::Unhealthy {
            return;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= unhealthy_threshold {
            self.state.store(HealthState::Unhealthy as u8, Ordering::Relaxed);
            self.consecutive_failures.store(0, Ordering::Relaxed);
        }
    }
}

/// A RAII guard that manages the active connection count.
#[derive(Debug)]
pub struct BackendConnectionGuard {
    pub backend: Arc<Backend>,
}

impl Deref for BackendConnectionGuard {
    type Target = Backend;
    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for BackendConnectionGuard {
    fn drop(&mut self) {
        self.backend.dec_connections();
    }
}
