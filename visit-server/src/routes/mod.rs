use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue, StatusCode};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::api;
use crate::core::ServerState;

pub mod logging;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Customer side - device sessions, verification codes
        .merge(api::session::router())
        // Staff side (+ public customer endpoints whitelisted in require_auth)
        .merge(api::tables::router())
        .merge(api::orders::router())
        .merge(api::tickets::router())
        // Health API - public route
        .merge(api::health::router())
}

/// Build a fully configured application with all middleware and state
///
/// Used by the HTTP server and by in-process tests
pub fn build_app(state: ServerState) -> Router {
    let request_timeout = state.config.request_timeout();
    build_router()
        // ========== Tower HTTP Middleware ==========
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        // Request logging
        .layer(axum_middleware::from_fn(logging::logging_middleware))
        .layer(TraceLayer::new_for_http())
        // ========== Application Middleware ==========
        // Staff authentication - injects CurrentUser before logging runs
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static("x-request-id")))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        .with_state(state)
}
