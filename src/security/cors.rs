//! Cross-origin resource sharing policy.
//!
//! # Responsibilities
//! - Decide whether a request origin is allow-listed
//! - Produce the CORS response headers for allowed origins
//! - Recognise preflight requests
//!
//! # Design Decisions
//! - Origin based, not path based: one policy for the whole route table
//! - The allowed origin is echoed, never `*`, since credentials are allowed
//! - Disallowed origins get no headers; the browser enforces the rest

use std::collections::HashSet;

use axum::http::{
    header::{
        ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
        ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN, VARY,
    },
    HeaderMap, HeaderValue, Method,
};

use crate::config::CorsConfig;

/// Compiled CORS policy.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: HashSet<String>,
    any_origin: bool,
    allow_methods: Option<HeaderValue>,
    allow_headers: Option<HeaderValue>,
    allow_credentials: bool,
    max_age: HeaderValue,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Self {
        let joined = |items: &[String]| {
            if items.is_empty() {
                None
            } else {
                HeaderValue::from_str(&items.join(", ")).ok()
            }
        };

        Self {
            allowed_origins: config.allowed_origins.iter().cloned().collect(),
            any_origin: config.allowed_origins.iter().any(|o| o == "*"),
            allow_methods: joined(&config.allowed_methods),
            allow_headers: joined(&config.allowed_headers),
            allow_credentials: config.allow_credentials,
            max_age: HeaderValue::from(config.max_age_secs),
        }
    }

    /// True if `origin` is allow-listed.
    pub fn is_allowed(&self, origin: &str) -> bool {
        self.any_origin || self.allowed_origins.contains(origin)
    }

    /// The request's `Origin` header, if present and allow-listed.
    pub fn allowed_origin<'a>(&self, request_headers: &'a HeaderMap) -> Option<&'a HeaderValue> {
        request_headers
            .get(ORIGIN)
            .filter(|origin| origin.to_str().is_ok_and(|o| self.is_allowed(o)))
    }

    /// Write the CORS headers for `origin` into `headers`, replacing any
    /// values set upstream.
    pub fn apply(&self, origin: &HeaderValue, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        if let Some(methods) = &self.allow_methods {
            headers.insert(ACCESS_CONTROL_ALLOW_METHODS, methods.clone());
        }
        if let Some(allowed) = &self.allow_headers {
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allowed.clone());
        }
        if self.allow_credentials {
            headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        } else {
            headers.remove(ACCESS_CONTROL_ALLOW_CREDENTIALS);
        }
        headers.insert(ACCESS_CONTROL_MAX_AGE, self.max_age.clone());

        let varies_on_origin = headers
            .get_all(VARY)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|v| v.trim().eq_ignore_ascii_case("origin"));
        if !varies_on_origin {
            headers.append(VARY, HeaderValue::from_static("Origin"));
        }
    }
}

/// A preflight is an `OPTIONS` request carrying `Origin` and
/// `Access-Control-Request-Method`.
pub fn is_preflight(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS && headers.contains_key(ORIGIN) && headers.contains_key(ACCESS_CONTROL_REQUEST_METHOD)
}
