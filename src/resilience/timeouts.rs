//! Timeout enforcement for upstream calls.
//!
//! # Responsibilities
//! - Configure the connect timeout on the upstream connector
//! - Bound the wait for upstream response headers
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from connection errors
//! - Timed-out requests return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

use hyper_util::client::legacy::connect::HttpConnector;
use tokio::time::error::Elapsed;

use crate::config::TimeoutConfig;

/// Upstream deadlines derived from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamTimeouts {
    pub connect: Duration,
    pub response: Duration,
}

impl UpstreamTimeouts {
    pub fn from_config(config: &TimeoutConfig) -> Self {
        Self {
            connect: Duration::from_secs(config.connect_secs),
            response: Duration::from_secs(config.upstream_secs),
        }
    }

    /// HTTP connector honouring the connect timeout.
    pub fn connector(&self) -> HttpConnector {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(self.connect));
        connector.set_nodelay(true);
        connector
    }

    /// Run `fut` under the response deadline.
    pub async fn within<F: Future>(&self, fut: F) -> Result<F::Output, Elapsed> {
        tokio::time::timeout(self.response, fut).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_within_deadline() {
        let timeouts = UpstreamTimeouts {
            connect: Duration::from_secs(1),
            response: Duration::from_millis(50),
        };

        assert_eq!(timeouts.within(async { 7 }).await.unwrap(), 7);
        assert!(timeouts
            .within(tokio::time::sleep(Duration::from_secs(5)))
            .await
            .is_err());
    }

    #[test]
    fn test_from_config() {
        let timeouts = UpstreamTimeouts::from_config(&TimeoutConfig {
            connect_secs: 2,
            upstream_secs: 9,
            request_secs: 30,
        });
        assert_eq!(timeouts.connect, Duration::from_secs(2));
        assert_eq!(timeouts.response, Duration::from_secs(9));
    }
}
