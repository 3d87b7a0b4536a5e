//! Gateway-level request failures.
//!
//! Upstream error statuses are not errors here: they are relayed to the
//! client unchanged. These variants cover requests the gateway itself could
//! not complete.

use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

use crate::load_balancer::DiscoveryError;
use crate::routing::RoutingError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    ServiceUnavailable(#[from] DiscoveryError),

    #[error("upstream {upstream} unreachable: {source}")]
    UpstreamUnreachable {
        upstream: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("upstream {upstream} did not respond within {timeout:?}")]
    UpstreamTimeout { upstream: String, timeout: Duration },

    #[error("cannot build upstream request: {0}")]
    InvalidUpstreamRequest(String),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

impl GatewayError {
    /// HTTP status returned to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Routing(_) => StatusCode::NOT_FOUND,
            GatewayError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::InvalidUpstreamRequest(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Routing(_) => "no_route",
            GatewayError::ServiceUnavailable(_) => "unavailable",
            GatewayError::UpstreamUnreachable { .. } => "unreachable",
            GatewayError::UpstreamTimeout { .. } => "timeout",
            GatewayError::InvalidUpstreamRequest(_) => "invalid_request",
            GatewayError::BodyTooLarge { .. } => "body_too_large",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn test_status_mapping() {
        let no_match = GatewayError::from(RoutingError::NoMatch {
            method: Method::GET,
            path: "/nowhere".into(),
        });
        assert_eq!(no_match.status(), StatusCode::NOT_FOUND);

        let unavailable = GatewayError::from(DiscoveryError::NoAvailableInstance("users-service".into()));
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.to_string(), "no available instance of service 'users-service'");

        let timeout = GatewayError::UpstreamTimeout {
            upstream: "127.0.0.1:8081".into(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.kind(), "timeout");

        assert_eq!(
            GatewayError::InvalidUpstreamRequest("bad uri".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(GatewayError::BodyTooLarge { limit: 10 }.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
