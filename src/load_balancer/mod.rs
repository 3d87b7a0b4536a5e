//! Load balancing and service resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → target lb://<service>
//!     → discovery.rs (ServiceResolver::resolve)
//!     → pool.rs (static registry: instances of the service)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through backends)
//!         - least_conn.rs (pick backend with fewest connections)
//!         - random.rs (random start, first available)
//!     → backend.rs (connection guard)
//!     → Return backend guard or DiscoveryError
//! ```
//!
//! # Design Decisions
//! - Algorithm selection per service
//! - Unhealthy or saturated backends excluded from selection, unless every
//!   instance is unhealthy (then the least recently failed one is tried)
//! - Resolution is a trait so other discovery backends can plug in

use std::sync::Arc;

pub mod backend;
pub mod discovery;
pub mod least_conn;
pub mod pool;
pub mod random;
pub mod round_robin;

pub use discovery::{DiscoveryError, ServiceResolver};
pub use pool::ServiceRegistry;

use crate::config::schema::BalanceStrategy;
use backend::Backend;

/// Strategy choosing one backend out of a service's instances.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Next backend to use, or `None` if no backend is available.
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>>;
}

/// Instantiate the configured strategy.
pub fn balancer_for(strategy: BalanceStrategy) -> Box<dyn LoadBalancer> {
    match strategy {
        BalanceStrategy::RoundRobin => Box::new(round_robin::RoundRobin::new()),
        BalanceStrategy::LeastConnections => Box::new(least_conn::LeastConnections::new()),
        BalanceStrategy::Random => Box::new(random::RandomChoice::new()),
    }
}
