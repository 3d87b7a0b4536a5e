//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::{backend::Backend, LoadBalancer};

/// Round-robin selector.
/// Stores an internal counter to rotate through backends.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        if backends.is_empty() {
            return None;
        }

        // Skip unavailable backends; give up after one full lap.
        let start_count = self.counter.fetch_add(1, Ordering::Relaxed);
        let len = backends.len();

        for i in 0..len {
            let index = (start_count + i) % len;
            let backend = &backends[index];
            if backend.is_available() {
                return Some(backend.clone());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(port: u16) -> Arc<Backend> {
        Arc::new(Backend::new("svc", &format!("http://127.0.0.1:{port}"), 100).unwrap())
    }

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        let b1 = backend(8080);
        let b2 = backend(8081);
        let backends = vec![b1.clone(), b2.clone()];

        let s1 = lb.next_server(&backends).unwrap();
        assert_eq!(s1.authority, b1.authority);

        let s2 = lb.next_server(&backends).unwrap();
        assert_eq!(s2.authority, b2.authority);

        let s3 = lb.next_server(&backends).unwrap();
        assert_eq!(s3.authority, b1.authority);
    }

    #[test]
    fn test_skips_unhealthy() {
        let lb = RoundRobin::new();
        let b1 = backend(8080);
        let b2 = backend(8081);
        b1.mark_failure(1);
        let backends = vec![b1, b2.clone()];

        for _ in 0..4 {
            assert_eq!(lb.next_server(&backends).unwrap().authority, b2.authority);
        }

        b2.mark_failure(1);
        assert!(lb.next_server(&backends).is_none());
    }
}
