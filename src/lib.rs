//! API gateway library: path-based routing with rewrites onto logical
//! services or static upstreams, with a uniform CORS policy.

pub mod config;
pub mod error;
pub mod http;
pub mod routing;
pub mod health;
pub mod load_balancer;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
