//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{token}`     - Short link redirect (public)
//! - `GET  /health`      - Health check: DB, cache, click queue (public)
//! - `/api/*`            - REST API (Bearer token required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket (proxy-aware when configured)
//! - **Authentication** - Bearer token on the API
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// When `state.behind_proxy` is true, throttling keys on the client IP from
/// `X-Forwarded-For` / `X-Real-IP` instead of the peer socket address.
///
/// The service must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let api_router = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    let redirect_router = Router::new().route("/{token}", get(redirect_handler));

    let (api_router, redirect_router) = if state.behind_proxy {
        (
            api_router.layer(rate_limit::secure_proxied_layer()),
            redirect_router.layer(rate_limit::proxied_layer()),
        )
    } else {
        (
            api_router.layer(rate_limit::secure_layer()),
            redirect_router.layer(rate_limit::layer()),
        )
    };

    let router = Router::new()
        .route("/health", get(health_handler))
        .merge(redirect_router)
        .nest("/api", api_router)
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
