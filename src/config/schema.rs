//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Front-end address used when `gateway.frontend.uri` is not configured.
pub const DEFAULT_FRONTEND_URI: &str = "http://localhost:5173";

/// Root configuration for the API gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, backpressure).
    pub listener: ListenerConfig,

    /// Static front-end target used by the catch-all route.
    pub frontend: FrontendConfig,

    /// Route table, evaluated top to bottom.
    /// When empty, [`GatewayConfig::route_table`] supplies the default table.
    pub routes: Vec<RouteConfig>,

    /// Logical services and their instances (static discovery).
    pub services: Vec<ServiceConfig>,

    /// Cross-origin policy applied to every response.
    pub cors: CorsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            frontend: FrontendConfig::default(),
            routes: Vec::new(),
            services: default_services(),
            cors: CorsConfig::default(),
            timeouts: TimeoutConfig::default(),
            retries: RetryConfig::default(),
            health_check: HealthCheckConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// The effective route table.
    pub fn route_table(&self) -> Vec<RouteConfig> {
        if self.routes.is_empty() {
            default_routes(&self.frontend.uri)
        } else {
            self.routes.clone()
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrently handled requests (backpressure).
    pub max_in_flight: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_in_flight: 10_000,
        }
    }
}

/// Front-end fallback target (`gateway.frontend.uri`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub uri: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_FRONTEND_URI.to_string(),
        }
    }
}

/// Route configuration mapping path patterns to a target.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Path patterns; the route matches if any of them matches.
    pub paths: Vec<String>,

    /// Accepted methods. Empty accepts every method.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Regex rewrites applied in order to the request path.
    #[serde(default)]
    pub rewrites: Vec<RewriteConfig>,

    /// `lb://<service>` or a literal `http://` URI.
    pub uri: String,
}

/// A single path rewrite: regex pattern and replacement template.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RewriteConfig {
    pub pattern: String,
    pub replacement: String,
}

/// The route table used when none is configured.
pub fn default_routes(frontend_uri: &str) -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            name: "users-service".to_string(),
            paths: vec!["/api/users/**".to_string(), "/users/**".to_string()],
            methods: Vec::new(),
            rewrites: vec![RewriteConfig {
                pattern: "^/api/users(?<segment>/?.*)$".to_string(),
                replacement: "/users${segment}".to_string(),
            }],
            uri: "lb://users-service".to_string(),
        },
        RouteConfig {
            name: "sales-service".to_string(),
            paths: vec!["/api/sales/**".to_string(), "/sales/**".to_string()],
            methods: Vec::new(),
            rewrites: vec![RewriteConfig {
                pattern: "^/(?:api/)?sales(?<segment>/?.*)$".to_string(),
                replacement: "${segment}".to_string(),
            }],
            uri: "lb://sales-service".to_string(),
        },
        RouteConfig {
            name: "frontend".to_string(),
            paths: vec!["/**".to_string()],
            methods: Vec::new(),
            rewrites: Vec::new(),
            uri: frontend_uri.to_string(),
        },
    ]
}

/// Selection strategy among the instances of one service.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStrategy {
    #[default]
    RoundRobin,
    LeastConnections,
    Random,
}

/// A logical service resolvable through `lb://<name>`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Logical service name.
    pub name: String,

    /// Instance base URLs (e.g., "http://127.0.0.1:8081").
    pub instances: Vec<String>,

    /// Load balancing strategy for this service.
    #[serde(default)]
    pub strategy: BalanceStrategy,

    /// Maximum concurrent requests to a single instance.
    #[serde(default = "default_max_backend_conns")]
    pub max_connections: usize,
}

fn default_max_backend_conns() -> usize {
    100
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            instances: Vec::new(),
            strategy: BalanceStrategy::default(),
            max_connections: default_max_backend_conns(),
        }
    }
}

/// Default static registry: one local instance per service.
pub fn default_services() -> Vec<ServiceConfig> {
    vec![
        ServiceConfig {
            name: "users-service".to_string(),
            instances: vec!["http://127.0.0.1:8081".to_string()],
            ..ServiceConfig::default()
        },
        ServiceConfig {
            name: "sales-service".to_string(),
            instances: vec!["http://127.0.0.1:8082".to_string()],
            ..ServiceConfig::default()
        },
    ]
}

/// Cross-origin resource sharing policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins that receive CORS headers (exact match).
    pub allowed_origins: Vec<String>,

    /// Value of `Access-Control-Allow-Methods`.
    pub allowed_methods: Vec<String>,

    /// Value of `Access-Control-Allow-Headers`.
    pub allowed_headers: Vec<String>,

    /// Emit `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: ["Content-Type", "Authorization", "x-requested-with"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            allow_credentials: true,
            max_age_secs: 3600,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Deadline for the upstream response headers in seconds.
    pub upstream_secs: u64,

    /// Total time for handling one inbound request in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            request_secs: 60,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries. Off by default: the gateway is a transparent relay.
    pub enabled: bool,

    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Percentage of requests that can be retries (retry budget).
    /// e.g., 0.1 for 10% budget.
    pub budget_ratio: f32,

    /// Largest request body buffered so that it can be replayed.
    pub max_buffered_body_bytes: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
            budget_ratio: 0.1,
            max_buffered_body_bytes: 1024 * 1024,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health checks.
    pub enabled: bool,

    /// Health check interval in seconds.
    pub interval_secs: u64,

    /// Health check timeout in seconds.
    pub timeout_secs: u64,

    /// Path to probe for HTTP health checks.
    pub path: String,

    /// Number of consecutive failures before marking unhealthy.
    pub unhealthy_threshold: u32,

    /// Number of consecutive successes before marking healthy.
    pub healthy_threshold: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 10,
            timeout_secs: 5,
            path: "/actuator/health".to_string(),
            unhealthy_threshold: 3,
            healthy_threshold: 2,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
