//! HTTP API application wiring (Axum router + middleware stack).
//!
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `errors.rs`: the `{reason, message}` error envelope

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Extension, Router,
    error_handling::HandleErrorLayer,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::catch_panic::CatchPanicLayer;

use fastblog_auth::TokenManager;

use crate::biz::Biz;
use crate::middleware;

pub mod errors;
pub mod routes;

/// Build the REST router served in HTTP mode. Handlers running longer than
/// `timeout` are answered with `RequestTimeout`.
pub fn build_app(biz: Biz, tokens: Arc<TokenManager>, timeout: Duration) -> Router {
    let auth_state = middleware::AuthState { tokens };

    // Protected routes: require a valid bearer token.
    let protected = routes::protected_router()
        .route_layer(from_fn_with_state(auth_state, middleware::auth_middleware));

    let router = Router::new()
        .route("/healthz", get(routes::system::healthz))
        .merge(routes::public_router())
        .merge(protected)
        .fallback(routes::system::not_found)
        .layer(Extension(biz));

    with_common_layers(router, timeout)
}

/// Wrap `router` in the shared stack. Outermost first: panic recovery,
/// request ID, no-cache headers, CORS, then the per-request timeout.
pub fn with_common_layers(router: Router, timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(CatchPanicLayer::custom(middleware::handle_panic))
            .layer(from_fn(middleware::request_id))
            .layer(from_fn(middleware::no_cache))
            .layer(from_fn(middleware::cors))
            .layer(HandleErrorLayer::new(middleware::handle_timeout))
            .layer(TimeoutLayer::new(timeout)),
    )
}
