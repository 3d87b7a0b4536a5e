//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay upstream responses (status, headers, streamed body)
//! - Render gateway errors as JSON bodies
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Hop-by-hop headers stripped automatically
//! - Upstream error statuses are relayed, not rewritten

use axum::{
    body::{Body, Bytes, HttpBody},
    http::{header::CONTENT_TYPE, HeaderValue, Response as HttpResponse},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::GatewayError;
use crate::security::headers::strip_hop_by_hop;

/// JSON body returned for gateway errors.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody<'a> {
    pub status: u16,
    pub error: &'a str,
    pub message: String,
    pub path: &'a str,
    pub request_id: &'a str,
}

/// Render `error` for the request at `path`.
pub fn error_response(error: &GatewayError, path: &str, request_id: &str) -> Response {
    let status = error.status();
    let body = ErrorBody {
        status: status.as_u16(),
        error: status.canonical_reason().unwrap_or("Error"),
        message: error.to_string(),
        path,
        request_id,
    };

    match serde_json::to_vec(&body) {
        Ok(json) => {
            let mut response = (status, json).into_response();
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(_) => status.into_response(),
    }
}

/// Convert an upstream response into ours, dropping hop-by-hop headers.
pub fn relay<B>(upstream: HttpResponse<B>) -> Response
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<axum::BoxError>,
{
    let (mut parts, body) = upstream.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}
