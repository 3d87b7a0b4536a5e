//! Header manipulation for forwarded requests.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Add X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host
//! - Add X-Forwarded-Prefix when a rewrite removed a path prefix
//!
//! # Design Decisions
//! - Preserve the original client IP chain in X-Forwarded-For
//! - Existing X-Forwarded-Proto/Host from an outer proxy are kept

use std::net::SocketAddr;

use axum::http::{
    header::{CONNECTION, HOST, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING, UPGRADE},
    HeaderMap, HeaderName, HeaderValue,
};

pub static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub static X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub static X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub static X_FORWARDED_PREFIX: HeaderName = HeaderName::from_static("x-forwarded-prefix");

const KEEP_ALIVE: &str = "keep-alive";

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }

    for name in [CONNECTION, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING, UPGRADE] {
        headers.remove(name);
    }
    headers.remove(KEEP_ALIVE);
}

/// The leading part of `original` that a rewrite removed, if any.
///
/// `/sales/456` → `/456` gives `/sales`; `/api/users/1` → `/users/1` gives `/api`;
/// `/sales` → `/` gives `/sales`.
pub fn stripped_prefix<'a>(original: &'a str, rewritten: &str) -> Option<&'a str> {
    if original == rewritten {
        return None;
    }
    // A path rewritten down to `/` kept nothing of the original.
    let suffix = if rewritten == "/" && !original.ends_with('/') { "" } else { rewritten };
    let prefix = original.strip_suffix(suffix)?.trim_end_matches('/');
    (!prefix.is_empty()).then_some(prefix)
}

/// Prepare request headers for the upstream.
///
/// `Host` is dropped so the client derives it from the upstream URI.
pub fn prepare_upstream_headers(
    headers: &mut HeaderMap,
    client: Option<SocketAddr>,
    original_path: &str,
    rewritten_path: &str,
) {
    let original_host = headers.remove(HOST);
    strip_hop_by_hop(headers);

    if let Some(client) = client {
        let ip = client.ip().to_string();
        let chain = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(existing) if !existing.is_empty() => format!("{}, {}", existing, ip),
            _ => ip,
        };
        if let Ok(value) = HeaderValue::from_str(&chain) {
            headers.insert(X_FORWARDED_FOR.clone(), value);
        }
    }

    if !headers.contains_key(&X_FORWARDED_PROTO) {
        headers.insert(X_FORWARDED_PROTO.clone(), HeaderValue::from_static("http"));
    }

    if let Some(host) = original_host {
        if !headers.contains_key(&X_FORWARDED_HOST) {
            headers.insert(X_FORWARDED_HOST.clone(), host);
        }
    }

    if let Some(prefix) = stripped_prefix(original_path, rewritten_path) {
        if let Ok(value) = HeaderValue::from_str(prefix) {
            headers.insert(X_FORWARDED_PREFIX.clone(), value);
        }
    }
}
