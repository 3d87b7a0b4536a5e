//! Least Connections load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{backend::Backend, LoadBalancer};

/// Least connections selector.
/// Selects the available backend with the minimum number of active connections.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastConnections {
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        // In case of tie, the first one is selected (stability)
        backends
            .iter()
            .filter(|b| b.is_available())
            .min_by_key(|b| b.connection_count())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_least_conn() {
        let lb = LeastConnections::new();
        let b1 = Arc::new(Backend::new("svc", "http://127.0.0.1:8080", 100).unwrap());
        let b2 = Arc::new(Backend::new("svc", "http://127.0.0.1:8081", 100).unwrap());

        b1.inc_connections();

        let backends = vec![b1.clone(), b2.clone()];

        // Should pick b2 (0 connections)
        let s1 = lb.next_server(&backends).unwrap();
        assert_eq!(s1.authority, b2.authority);

        b2.inc_connections();
        b2.inc_connections(); // now b2 has 2, b1 has 1

        let s2 = lb.next_server(&backends).unwrap();
        assert_eq!(s2.authority, b1.authority);
    }

    #[test]
    fn test_ignores_unhealthy_even_if_idle() {
        let lb = LeastConnections::new();
        let idle = Arc::new(Backend::new("svc", "http://127.0.0.1:8080", 100).unwrap());
        let busy = Arc::new(Backend::new("svc", "http://127.0.0.1:8081", 100).unwrap());
        idle.mark_failure(1);
        busy.inc_connections();

        let picked = lb.next_server(&[idle, busy.clone()]).unwrap();
        assert_eq!(picked.authority, busy.authority);
        assert!(lb.next_server(&[]).is_none());
    }
}
