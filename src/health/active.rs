//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every registered service instance
//! - Update backend health state based on results

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::{header::USER_AGENT, Request};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::http::server::GatewayState;
use crate::load_balancer::backend::Backend;
use crate::observability::metrics;

pub struct HealthMonitor {
    gateway: Arc<ArcSwap<GatewayState>>,
    interval: Duration,
    client: Client<HttpConnector, Body>,
}

impl HealthMonitor {
    /// The probe interval is fixed at construction; path, timeout and
    /// thresholds are read from the live snapshot on every round.
    pub fn new(gateway: Arc<ArcSwap<GatewayState>>, config: &HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            gateway,
            interval: Duration::from_secs(config.interval_secs.max(1)),
            client,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Health monitor starting");

        let mut ticker = time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn check_all(&self) {
        let snapshot = self.gateway.load_full();
        let config = &snapshot.health_check;
        if !config.enabled {
            return;
        }

        for backend in snapshot.registry.all_backends() {
            let healthy = self.probe(&backend, config).await;

            if healthy {
                backend.mark_success(config.healthy_threshold as usize);
            } else {
                backend.mark_failure(config.unhealthy_threshold as usize);
            }

            metrics::record_backend_health(&backend.service, &backend.authority, backend.is_healthy());
        }
    }

    async fn probe(&self, backend: &Backend, config: &HealthCheckConfig) -> bool {
        let uri = format!("{}://{}{}", backend.base_url.scheme(), backend.authority, config.path);

        let request = match Request::get(uri)
            .header(USER_AGENT, "api-gateway-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(instance = %backend.authority, error = %e, "Failed to build health check request");
                return false;
            }
        };

        let timeout = Duration::from_secs(config.timeout_secs);
        match time::timeout(timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let success = response.status().is_success();
                if !success {
                    tracing::warn!(
                        service = %backend.service,
                        instance = %backend.authority,
                        status = %response.status(),
                        "Health check failed: non-success status"
                    );
                }
                success
            }
            Ok(Err(e)) => {
                tracing::warn!(service = %backend.service, instance = %backend.authority, error = %e, "Health check failed: connection error");
                false
            }
            Err(_) => {
                tracing::warn!(service = %backend.service, instance = %backend.authority, "Health check failed: timeout");
                false
            }
        }
    }
}
