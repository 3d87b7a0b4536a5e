//! Static service registry.
//!
//! # Responsibilities
//! - Manage the instances of each logical service, grouped by name
//! - Apply the service's load balancing algorithm to select an instance
//! - Provide connection guards for tracking

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::load_balancer::{
    backend::{Backend, BackendConnectionGuard},
    balancer_for,
    discovery::{DiscoveryError, ServiceResolver},
    LoadBalancer,
};

#[derive(Debug)]
struct ServiceGroup {
    backends: Vec<Arc<Backend>>,
    balancer: Box<dyn LoadBalancer>,
}

impl ServiceGroup {
    /// Only when no instance is healthy: the instance that failed least
    /// recently and still has capacity. Its outcomes feed passive health,
    /// so a recovered instance turns healthy again.
    fn fallback(&self) -> Option<BackendConnectionGuard> {
        if self.backends.iter().any(|b| b.is_healthy()) {
            return None;
        }

        let mut candidates: Vec<&Arc<Backend>> = self.backends.iter().filter(|b| b.has_capacity()).collect();
        candidates.sort_by_key(|b| b.last_failure().unwrap_or(0));
        candidates.into_iter().find_map(|b| b.try_create_guard())
    }
}

/// Config-driven registry of service instances.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    groups: HashMap<String, ServiceGroup>,
}

impl ServiceRegistry {
    /// Create a registry from configuration. Invalid instance URLs are
    /// skipped with a warning (validation rejects them earlier).
    pub fn new(configs: &[ServiceConfig]) -> Self {
        let mut groups = HashMap::new();

        for config in configs {
            let backends: Vec<Arc<Backend>> = config
                .instances
                .iter()
                .filter_map(|instance| {
                    match Backend::new(config.name.clone(), instance, config.max_connections) {
                        Ok(b) => Some(Arc::new(b)),
                        Err(e) => {
                            tracing::warn!(service = %config.name, instance = %instance, error = %e, "Invalid instance URL");
                            None
                        }
                    }
                })
                .collect();

            tracing::debug!(
                service = %config.name,
                instances = backends.len(),
                strategy = ?config.strategy,
                "Registered service"
            );

            groups.insert(
                config.name.clone(),
                ServiceGroup {
                    backends,
                    balancer: balancer_for(config.strategy),
                },
            );
        }

        Self { groups }
    }

    /// Names of all registered services.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Instances of one service.
    pub fn backends(&self, service: &str) -> &[Arc<Backend>] {
        self.groups
            .get(service)
            .map(|g| g.backends.as_slice())
            .unwrap_or(&[])
    }

    /// Return a list of all backends (for health checking).
    pub fn all_backends(&self) -> Vec<Arc<Backend>> {
        self.groups
            .values()
            .flat_map(|g| g.backends.iter())
            .cloned()
            .collect()
    }
}

impl ServiceResolver for ServiceRegistry {
    fn resolve(&self, service: &str) -> Result<BackendConnectionGuard, DiscoveryError> {
        let group = self
            .groups
            .get(service)
            .ok_or_else(|| DiscoveryError::UnknownService(service.to_string()))?;

        // A selected backend can fill up between selection and guard
        // creation; try each instance at most once.
        for _ in 0..group.backends.len() {
            match group.balancer.next_server(&group.backends) {
                Some(backend) => {
                    if let Some(guard) = backend.try_create_guard() {
                        return Ok(guard);
                    }
                }
                None => break,
            }
        }

        if let Some(guard) = group.fallback() {
            tracing::warn!(
                service = %service,
                instance = %guard.authority,
                "Every instance is unhealthy, trying the least recently failed one"
            );
            return Ok(guard);
        }

        tracing::debug!(service = %service, backend_count = group.backends.len(), "No available backends found");
        for b in &group.backends {
            tracing::debug!(
                addr = %b.authority,
                state = b.health().as_str(),
                connections = b.connection_count(),
                "Backend status"
            );
        }
        Err(DiscoveryError::NoAvailableInstance(service.to_string()))
    }
}
