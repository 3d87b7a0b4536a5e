//! Request forwarding.
//!
//! # Responsibilities
//! - Match the request against the route table of the current snapshot
//! - Resolve the target to a concrete upstream
//! - Rewrite the path, prepare headers, forward under a deadline
//! - Feed outcomes to passive health checks and metrics
//! - Retry safe requests when retries are enabled
//!
//! # Design Decisions
//! - One snapshot per request; a concurrent reload never mixes tables
//! - Bodies are streamed unless a retry may need to replay them
//! - Only scheme and authority of the target are used; the path comes
//!   from the (rewritten) request

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::{Request, StatusCode, Uri},
    response::Response,
};

use crate::error::GatewayError;
use crate::health::passive::{self, Outcome};
use crate::http::request::request_id;
use crate::http::response::{error_response, relay};
use crate::http::server::{AppState, GatewayState};
use crate::load_balancer::backend::BackendConnectionGuard;
use crate::observability::metrics;
use crate::resilience::{backoff::calculate_backoff, is_retryable};
use crate::routing::{RouteMatch, Target};
use crate::security::headers::prepare_upstream_headers;

/// Main proxy handler.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let gateway = state.gateway.load_full();

    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Proxying request"
    );

    let (route, result) = match gateway.router.route(&method, &path) {
        Ok(matched) => {
            let route = matched.route.to_string();
            let result = forward(&state, &gateway, &matched, request, client_addr, &request_id).await;
            (route, result)
        }
        Err(e) => ("none".to_string(), Err(GatewayError::from(e))),
    };

    match result {
        Ok(response) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), &route, start);
            response
        }
        Err(err) => {
            let status = err.status();
            match &err {
                GatewayError::Routing(_) => {
                    tracing::warn!(request_id = %request_id, method = %method, path = %path, "No route matched");
                }
                _ => {
                    tracing::error!(
                        request_id = %request_id,
                        route = %route,
                        method = %method,
                        path = %path,
                        status = status.as_u16(),
                        error = %err,
                        "Request failed at gateway"
                    );
                    metrics::record_upstream_failure(&route, err.kind());
                }
            }
            metrics::record_request(method.as_str(), status.as_u16(), &route, start);
            error_response(&err, &path, &request_id)
        }
    }
}

/// Concrete destination of one attempt.
struct Upstream {
    scheme: String,
    authority: String,
    /// Held for the duration of the attempt when the target is a service.
    guard: Option<BackendConnectionGuard>,
}

impl Upstream {
    fn select(gateway: &GatewayState, target: &Target) -> Result<Self, GatewayError> {
        match target {
            Target::Service(name) => {
                let guard = gateway.resolver.resolve(name)?;
                Ok(Self {
                    scheme: guard.base_url.scheme().to_string(),
                    authority: guard.authority.clone(),
                    guard: Some(guard),
                })
            }
            Target::Static(url) => {
                let host = url
                    .host_str()
                    .ok_or_else(|| GatewayError::InvalidUpstreamRequest(format!("target {} has no host", url)))?;
                let authority = match url.port_or_known_default() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                };
                Ok(Self {
                    scheme: url.scheme().to_string(),
                    authority,
                    guard: None,
                })
            }
        }
    }

    fn uri(&self, path_and_query: &str) -> Result<Uri, GatewayError> {
        format!("{}://{}{}", self.scheme, self.authority, path_and_query)
            .parse::<Uri>()
            .map_err(|e| GatewayError::InvalidUpstreamRequest(e.to_string()))
    }
}

async fn forward(
    state: &AppState,
    gateway: &GatewayState,
    matched: &RouteMatch<'_>,
    request: Request<Body>,
    client_addr: Option<SocketAddr>,
    request_id: &str,
) -> Result<Response, GatewayError> {
    let (mut parts, body) = request.into_parts();
    let method = parts.method.clone();

    prepare_upstream_headers(&mut parts.headers, client_addr, parts.uri.path(), &matched.path);

    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{}?{}", matched.path, query),
        None => matched.path.clone(),
    };

    let retries = &gateway.retries;
    let replayable = retries.enabled && is_retryable(&method, None, true);
    let max_attempts = if replayable { retries.max_attempts.max(1) } else { 1 };

    let mut streamed = None;
    let mut buffered: Option<Bytes> = None;
    if replayable {
        let limit = retries.max_buffered_body_bytes;
        let bytes = axum::body::to_bytes(body, limit)
            .await
            .map_err(|_| GatewayError::BodyTooLarge { limit })?;
        buffered = Some(bytes);
    } else {
        streamed = Some(body);
    }

    state.retry_budget.record_request();

    let mut attempt = 0;
    loop {
        attempt += 1;

        let upstream = Upstream::select(gateway, matched.target)?;
        let uri = upstream.uri(&path_and_query)?;

        let body = match (&buffered, streamed.take()) {
            (Some(bytes), _) => Body::from(bytes.clone()),
            (None, Some(body)) => body,
            (None, None) => Body::empty(),
        };
        let mut upstream_request = Request::new(body);
        *upstream_request.method_mut() = method.clone();
        *upstream_request.uri_mut() = uri;
        *upstream_request.headers_mut() = parts.headers.clone();

        tracing::debug!(
            request_id = %request_id,
            route = %matched.route,
            upstream = %upstream.authority,
            uri = %upstream_request.uri(),
            attempt = attempt,
            "Forwarding request"
        );

        let (result, outcome) = match gateway.timeouts.within(state.client.request(upstream_request)).await {
            Ok(Ok(response)) => {
                let status = response.status();
                (Ok(response), Outcome::Response(status))
            }
            Ok(Err(source)) => (
                Err(GatewayError::UpstreamUnreachable {
                    upstream: upstream.authority.clone(),
                    source,
                }),
                Outcome::ConnectionError,
            ),
            Err(_) => (
                Err(GatewayError::UpstreamTimeout {
                    upstream: upstream.authority.clone(),
                    timeout: gateway.timeouts.response,
                }),
                Outcome::Timeout,
            ),
        };

        if let Some(backend) = &upstream.guard {
            passive::record_outcome(backend, outcome, &gateway.health_check);
        }

        let status: Option<StatusCode> = result.as_ref().ok().map(|r| r.status());
        if attempt < max_attempts
            && is_retryable(&method, status, result.is_err())
            && state.retry_budget.can_retry()
        {
            let delay = calculate_backoff(attempt, retries.base_delay_ms, retries.max_delay_ms);
            tracing::info!(
                request_id = %request_id,
                attempt = attempt,
                delay = ?delay,
                outcome = ?outcome,
                "Retrying request"
            );
            drop(result);
            drop(upstream);
            tokio::time::sleep(delay).await;
            continue;
        }

        return result.map(relay);
    }
}
