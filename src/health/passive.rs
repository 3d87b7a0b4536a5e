//! Passive health checking (failure detection).
//!
//! # Responsibilities
//! - Observe request outcomes
//! - Track consecutive failures
//! - Trigger state transition on threshold breach
//!
//! # Design Decisions
//! - Connection errors, timeouts and 502/503/504 count as failures
//! - Other statuses, 500 and 4xx included, are answers from a live instance
//! - Thread-safe counters for concurrent request tracking

use axum::http::StatusCode;

use crate::config::HealthCheckConfig;
use crate::load_balancer::backend::Backend;
use crate::observability::metrics;

/// How a forwarded request ended, from the instance's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Response(StatusCode),
    ConnectionError,
    Timeout,
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        match self {
            Outcome::Response(status) => matches!(
                *status,
                StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
            ),
            Outcome::ConnectionError | Outcome::Timeout => true,
        }
    }
}

/// Feed one request outcome into the backend's health state machine.
pub fn record_outcome(backend: &Backend, outcome: Outcome, config: &HealthCheckConfig) {
    let before = backend.health();

    if outcome.is_failure() {
        backend.mark_failure(config.unhealthy_threshold as usize);
    } else {
        backend.mark_success(config.healthy_threshold as usize);
    }

    let after = backend.health();
    if before != after {
        tracing::warn!(
            service = %backend.service,
            instance = %backend.authority,
            from = before.as_str(),
            to = after.as_str(),
            outcome = ?outcome,
            "Backend health changed"
        );
        metrics::record_backend_health(&backend.service, &backend.authority, backend.is_healthy());
    }
}
