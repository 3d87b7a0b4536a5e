//! Route targets.

use std::fmt;
use thiserror::Error;
use url::Url;

/// Scheme prefix naming a logical service.
pub const LOAD_BALANCED_SCHEME: &str = "lb://";

/// Where a matched request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Logical service resolved per request by the service resolver.
    Service(String),
    /// Fixed upstream, e.g. the front-end.
    Static(Url),
}

/// Error raised for an unusable target URI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("missing service name after 'lb://'")]
    EmptyServiceName,
    #[error("service name '{0}' must not contain '/'")]
    InvalidServiceName(String),
    #[error("invalid URI: {0}")]
    InvalidUri(#[from] url::ParseError),
    #[error("unsupported scheme '{0}', expected http or lb")]
    UnsupportedScheme(String),
}

impl Target {
    /// Parse `lb://<service>` or a literal `http://` URI.
    pub fn parse(uri: &str) -> Result<Self, TargetError> {
        if let Some(name) = uri.strip_prefix(LOAD_BALANCED_SCHEME) {
            let name = name.trim_end_matches('/');
            if name.is_empty() {
                return Err(TargetError::EmptyServiceName);
            }
            if name.contains('/') {
                return Err(TargetError::InvalidServiceName(name.to_string()));
            }
            return Ok(Target::Service(name.to_string()));
        }

        let url = Url::parse(uri)?;
        if url.scheme() != "http" {
            return Err(TargetError::UnsupportedScheme(url.scheme().to_string()));
        }
        Ok(Target::Static(url))
    }

    /// The logical service name, if this target is load balanced.
    pub fn service(&self) -> Option<&str> {
        match self {
            Target::Service(name) => Some(name),
            Target::Static(_) => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Service(name) => write!(f, "{}{}", LOAD_BALANCED_SCHEME, name),
            Target::Static(url) => write!(f, "{}", url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service_target() {
        let target = Target::parse("lb://users-service").unwrap();
        assert_eq!(target, Target::Service("users-service".into()));
        assert_eq!(target.service(), Some("users-service"));
        assert_eq!(target.to_string(), "lb://users-service");
    }

    #[test]
    fn test_parse_static_target() {
        let target = Target::parse("http://localhost:5173").unwrap();
        match &target {
            Target::Static(url) => {
                assert_eq!(url.host_str(), Some("localhost"));
                assert_eq!(url.port(), Some(5173));
            }
            other => panic!("unexpected target {other:?}"),
        }
        assert_eq!(target.service(), None);
    }

    #[test]
    fn test_rejects_bad_targets() {
        assert_eq!(Target::parse("lb://"), Err(TargetError::EmptyServiceName));
        assert!(matches!(
            Target::parse("lb://users/extra"),
            Err(TargetError::InvalidServiceName(_))
        ));
        assert!(matches!(
            Target::parse("https://example.com"),
            Err(TargetError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            Target::parse("not a uri"),
            Err(TargetError::InvalidUri(_))
        ));
    }
}
