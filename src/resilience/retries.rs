//! Retry logic.
//!
//! # Responsibilities
//! - Determine if a request is retryable (safe methods only)
//! - Enforce retry budget (retries as a share of requests per window)
//!
//! # Design Decisions
//! - Only GET/HEAD/OPTIONS are retried; bodies of other methods may have
//!   side effects upstream
//! - Connection errors and 502/503/504 are retryable, other statuses are not
//! - Retry budget prevents retry storms under load

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::{Method, StatusCode};

const BUDGET_WINDOW: Duration = Duration::from_secs(10);

/// Whether an attempt that ended with `status` (or a connection error)
/// may be retried.
pub fn is_retryable(method: &Method, status: Option<StatusCode>, connection_error: bool) -> bool {
    let safe = matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS);
    if !safe {
        return false;
    }
    if connection_error {
        return true;
    }
    matches!(
        status,
        Some(StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT)
    )
}

/// Caps retries at `ratio` of requests seen in the current window, with a
/// floor of `min_retries` per window.
#[derive(Debug)]
pub struct RetryBudget {
    ratio: f32,
    min_retries: u64,
    requests: AtomicU64,
    retries: AtomicU64,
    window_start: Mutex<Instant>,
}

impl RetryBudget {
    pub fn new(ratio: f32, min_retries: u64) -> Self {
        Self {
            ratio,
            min_retries,
            requests: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            window_start: Mutex::new(Instant::now()),
        }
    }

    /// Count an inbound request.
    pub fn record_request(&self) {
        self.roll_window();
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Reserve one retry if the budget allows it.
    pub fn can_retry(&self) -> bool {
        let requests = self.requests.load(Ordering::Relaxed);
        let allowed = ((requests as f64 * self.ratio as f64) as u64).max(self.min_retries);

        let mut current = self.retries.load(Ordering::Relaxed);
        loop {
            if current >= allowed {
                return false;
            }
            match self
                .retries
                .compare_exchange_weak(current, current + 1, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    fn roll_window(&self) {
        let Ok(mut start) = self.window_start.lock() else {
            return;
        };
        if start.elapsed() >= BUDGET_WINDOW {
            *start = Instant::now();
            self.requests.store(0, Ordering::Relaxed);
            self.retries.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_safe_methods_retry() {
        assert!(is_retryable(&Method::GET, None, true));
        assert!(is_retryable(&Method::HEAD, Some(StatusCode::SERVICE_UNAVAILABLE), false));
        assert!(!is_retryable(&Method::POST, None, true));
        assert!(!is_retryable(&Method::PUT, Some(StatusCode::BAD_GATEWAY), false));
        assert!(!is_retryable(&Method::DELETE, None, true));
    }

    #[test]
    fn test_only_gateway_statuses_retry() {
        assert!(is_retryable(&Method::GET, Some(StatusCode::GATEWAY_TIMEOUT), false));
        assert!(!is_retryable(&Method::GET, Some(StatusCode::INTERNAL_SERVER_ERROR), false));
        assert!(!is_retryable(&Method::GET, Some(StatusCode::NOT_FOUND), false));
        assert!(!is_retryable(&Method::GET, Some(StatusCode::OK), false));
    }

    #[test]
    fn test_budget_floor_and_ratio() {
        let budget = RetryBudget::new(0.5, 1);
        // Floor allows one retry before any request is recorded.
        assert!(budget.can_retry());
        assert!(!budget.can_retry());

        for _ in 0..10 {
            budget.record_request();
        }
        // 10 * 0.5 = 5 allowed, 1 already used.
        let granted = (0..10).filter(|_| budget.can_retry()).count();
        assert_eq!(granted, 4);
    }
}
