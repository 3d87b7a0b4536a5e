//! Random load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{backend::Backend, LoadBalancer};

/// Picks a random starting point, then the first available backend from there.
#[derive(Debug, Default)]
pub struct RandomChoice;

impl RandomChoice {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for RandomChoice {
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        if backends.is_empty() {
            return None;
        }

        let len = backends.len();
        let start = fastrand::usize(..len);
        (0..len)
            .map(|i| &backends[(start + i) % len])
            .find(|b| b.is_available())
            .cloned()
    }
}
