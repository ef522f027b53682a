//! Handler for per-link analytics.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::api::dto::analytics::AnalyticsResponse;
use crate::application::services::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;

/// Returns click analytics for one of the caller's links.
///
/// # Endpoint
///
/// `GET /api/analytics/{token}`
///
/// `token` is the link's short code or alias. Disabled links are included.
///
/// # Response
///
/// ```json
/// {
///   "totalClicks": 1523,
///   "recentClicks": [ { "shortCode": "my-link", "browser": "Chrome", ... } ],
///   "browserStats": { "Chrome": 61, "Firefox": 39 },
///   "deviceStats": { "Desktop": 80, "Mobile": 20 },
///   "osStats": { "Windows": 50, "MacOS": 50 }
/// }
/// ```
///
/// # Errors
///
/// Returns 404 if the link does not exist or is owned by someone else.
pub async fn analytics_handler(
    Path(token): Path<String>,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let analytics = state
        .analytics_service
        .summarize_by_token(&token, user.user_id)
        .await?;

    Ok(Json(analytics.into()))
}
