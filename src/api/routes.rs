//! API route configuration.
//!
//! All API endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`], which also identifies the owner.

use crate::api::handlers::{
    analytics_handler, create_link_handler, delete_link_handler, list_links_handler,
    update_link_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, put},
};

/// All API routes. The caller attaches the authentication layer.
///
/// # Endpoints
///
/// - `POST   /links`              - Create a short link
/// - `GET    /links`              - List the caller's links, newest first
/// - `PUT    /links/{id}`         - Update URL, alias or active flag
/// - `DELETE /links/{id}`         - Delete a link
/// - `GET    /analytics/{token}`  - Click analytics for a link
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/links", get(list_links_handler).post(create_link_handler))
        .route(
            "/links/{id}",
            put(update_link_handler).delete(delete_link_handler),
        )
        .route("/analytics/{token}", get(analytics_handler))
}
