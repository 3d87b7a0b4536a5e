//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + environment overrides
//!     → loader.rs (parse & deserialize, apply env)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → compiled into a GatewayState snapshot
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the GatewayState snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::CorsConfig;
pub use schema::GatewayConfig;
pub use schema::HealthCheckConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::RetryConfig;
pub use schema::RouteConfig;
pub use schema::ServiceConfig;
pub use schema::TimeoutConfig;
