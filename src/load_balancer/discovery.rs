//! Service discovery abstraction.

use thiserror::Error;

use crate::load_balancer::backend::BackendConnectionGuard;

/// Resolution of a logical service name failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("unknown service '{0}'")]
    UnknownService(String),
    #[error("no available instance of service '{0}'")]
    NoAvailableInstance(String),
}

/// Resolves a logical service name to a concrete instance.
///
/// Implementations decide how instances are found (static config, DNS,
/// a registry) and how one is picked among several.
pub trait ServiceResolver: Send + Sync + std::fmt::Debug {
    /// Pick an instance of `service`. The returned guard counts as an
    /// active connection until dropped.
    fn resolve(&self, service: &str) -> Result<BackendConnectionGuard, DiscoveryError>;
}
