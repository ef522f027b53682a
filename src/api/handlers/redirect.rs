//! Handler for short link redirects.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use std::net::SocketAddr;
use tracing::error;

use crate::application::services::VisitContext;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::extract_client_ip;
use crate::web::pages::{ErrorPage, NotFoundPage};

/// Redirects a short code or alias to its original URL.
///
/// # Endpoint
///
/// `GET /{token}`
///
/// # Request Flow
///
/// 1. Resolve the token (cache, then database) to an active link
/// 2. Hand the click to the background worker without waiting for it
/// 3. Return 307 Temporary Redirect
///
/// The destination may change later, so the redirect is never permanent.
///
/// # Responses
///
/// - **307** redirect to the original URL
/// - **404** HTML page if the token is unknown or the link is disabled
/// - **500** HTML page if the lookup itself fails
pub async fn redirect_handler(
    Path(token): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Response {
    let visit = VisitContext {
        ip: Some(extract_client_ip(&headers, addr, state.behind_proxy)),
        user_agent: header_value(&headers, header::USER_AGENT),
        referrer: header_value(&headers, header::REFERER),
    };

    match state.redirect_service.resolve(&token, visit).await {
        Ok(target) => Redirect::temporary(&target.original_url).into_response(),
        Err(AppError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            NotFoundPage {
                token,
                home_url: state.base_url.clone(),
            },
        )
            .into_response(),
        Err(e) => {
            error!(token, error = %e, "Failed to resolve short link");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorPage {
                    home_url: state.base_url.clone(),
                },
            )
                .into_response()
        }
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
