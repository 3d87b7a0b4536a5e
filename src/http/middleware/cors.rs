//! CORS Middleware.
//! Answers preflights from allowed origins and decorates every other response.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::server::AppState;
use crate::security::cors::is_preflight;

pub async fn cors_middleware(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let gateway = state.gateway.load_full();
    let origin = gateway.cors.allowed_origin(req.headers()).cloned();

    let Some(origin) = origin else {
        // Unknown or missing origin: route normally, add nothing.
        return next.run(req).await;
    };

    if is_preflight(req.method(), req.headers()) {
        tracing::debug!(origin = ?origin, path = %req.uri().path(), "Answering CORS preflight");
        let mut response = StatusCode::OK.into_response();
        gateway.cors.apply(&origin, response.headers_mut());
        return response;
    }

    let mut response = next.run(req).await;
    gateway.cors.apply(&origin, response.headers_mut());
    response
}
