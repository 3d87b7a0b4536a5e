//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (CORS, request ID, tracing, timeout, in-flight cap)
//! - Bind server to listener
//! - Swap the gateway snapshot on configuration reload
//! - Start active health monitoring when enabled

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    http::Request,
    middleware::from_fn_with_state,
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::validation::validate_config;
use crate::config::{GatewayConfig, HealthCheckConfig, RetryConfig};
use crate::health::active::HealthMonitor;
use crate::http::middleware::cors_middleware;
use crate::http::proxy::proxy_handler;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::load_balancer::{ServiceRegistry, ServiceResolver};
use crate::resilience::{RetryBudget, UpstreamTimeouts};
use crate::routing::{RouteBuildError, Router as RouteTable};
use crate::security::CorsPolicy;

/// Minimum retries granted per budget window regardless of traffic.
const MIN_RETRIES_PER_WINDOW: u64 = 10;

/// Everything a request needs, compiled from one validated configuration.
///
/// Immutable; a reload builds a new snapshot and swaps it in whole.
#[derive(Debug)]
pub struct GatewayState {
    pub router: RouteTable,
    pub cors: CorsPolicy,
    pub registry: Arc<ServiceRegistry>,
    pub resolver: Arc<dyn ServiceResolver>,
    pub timeouts: UpstreamTimeouts,
    pub retries: RetryConfig,
    pub health_check: HealthCheckConfig,
}

impl GatewayState {
    /// Compile `config`. Logical services resolve through `resolver` when
    /// given, otherwise through the configured static registry.
    pub fn from_config(
        config: &GatewayConfig,
        resolver: Option<Arc<dyn ServiceResolver>>,
    ) -> Result<Self, RouteBuildError> {
        let router = RouteTable::from_config(&config.route_table())?;
        let registry = Arc::new(ServiceRegistry::new(&config.services));
        let resolver = resolver.unwrap_or_else(|| registry.clone() as Arc<dyn ServiceResolver>);

        Ok(Self {
            router,
            cors: CorsPolicy::from_config(&config.cors),
            registry,
            resolver,
            timeouts: UpstreamTimeouts::from_config(&config.timeouts),
            retries: config.retries.clone(),
            health_check: config.health_check.clone(),
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ArcSwap<GatewayState>>,
    pub client: Client<HttpConnector, Body>,
    pub retry_budget: Arc<RetryBudget>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    gateway: Arc<ArcSwap<GatewayState>>,
    resolver: Option<Arc<dyn ServiceResolver>>,
}

impl HttpServer {
    /// Create a new HTTP server resolving services from the configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, RouteBuildError> {
        Self::build(config, None)
    }

    /// Create a server that resolves logical services through `resolver`.
    pub fn with_resolver(config: GatewayConfig, resolver: Arc<dyn ServiceResolver>) -> Result<Self, RouteBuildError> {
        Self::build(config, Some(resolver))
    }

    fn build(config: GatewayConfig, resolver: Option<Arc<dyn ServiceResolver>>) -> Result<Self, RouteBuildError> {
        let snapshot = GatewayState::from_config(&config, resolver.clone())?;
        let gateway = Arc::new(ArcSwap::from_pointee(snapshot));

        let timeouts = UpstreamTimeouts::from_config(&config.timeouts);
        let client = Client::builder(TokioExecutor::new()).build(timeouts.connector());

        let retry_budget = Arc::new(RetryBudget::new(config.retries.budget_ratio, MIN_RETRIES_PER_WINDOW));

        let state = AppState {
            gateway: gateway.clone(),
            client,
            retry_budget,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            gateway,
            resolver,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state.clone())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_in_flight))
            // Wraps the timeout and limit layers; their responses get CORS headers too.
            .layer(from_fn_with_state(state, cors_middleware))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = crate::http::request::request_id(request.headers());
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), UuidRequestId))
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Validated configurations received on `config_updates` replace the
    /// running snapshot; the server stops when `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.gateway.load().router.routes().len(),
            "HTTP server starting"
        );

        if self.config.health_check.enabled {
            let monitor = HealthMonitor::new(self.gateway.clone(), &self.config.health_check);
            let monitor_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                monitor.run(monitor_shutdown).await;
            });
        }

        let gateway = self.gateway.clone();
        let resolver = self.resolver.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                apply_update(&gateway, &new_config, resolver.clone());
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the startup config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Handle to the live snapshot.
    pub fn gateway(&self) -> Arc<ArcSwap<GatewayState>> {
        self.gateway.clone()
    }
}

/// Validate and compile `config`, then swap it in. Invalid configurations
/// leave the running snapshot untouched.
fn apply_update(
    gateway: &ArcSwap<GatewayState>,
    config: &GatewayConfig,
    resolver: Option<Arc<dyn ServiceResolver>>,
) {
    if let Err(errors) = validate_config(config) {
        for e in &errors {
            tracing::error!(error = %e, "Rejected configuration update");
        }
        return;
    }

    match GatewayState::from_config(config, resolver) {
        Ok(snapshot) => {
            let routes = snapshot.router.routes().len();
            gateway.store(Arc::new(snapshot));
            tracing::info!(routes, "Configuration reloaded");
        }
        Err(e) => tracing::error!(error = %e, "Rejected configuration update"),
    }
}
