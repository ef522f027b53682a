//! Handlers for link management endpoints (create, list, update, delete).

use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::links::{
    CreateLinkRequest, CreateLinkResponse, LinkDto, LinkListResponse, LinkResponse,
    MessageResponse, UpdateLinkRequest,
};
use crate::application::services::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for the authenticated user.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "originalUrl": "https://example.com/long/path",
///   "customAlias": "my-link"   // optional
/// }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "link": {...}, "shortUrl": "https://s.example.com/my-link" }`.
///
/// Every call counts toward the owner's daily quota, including calls that
/// later fail validation.
///
/// # Errors
///
/// - 400 malformed body, invalid URL or alias
/// - 409 alias already taken
/// - 429 daily quota reached (with `Retry-After`)
pub async fn create_link_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateLinkResponse>), AppError> {
    state.rate_limit_service.check(user.user_id).await?;

    let Json(payload) = payload?;
    payload.validate()?;

    let link = state
        .link_service
        .create(user.user_id, &payload.original_url, payload.custom_alias)
        .await?;

    let short_url = state.link_service.short_url(&link);

    Ok((
        StatusCode::CREATED,
        Json(CreateLinkResponse {
            link: link.into(),
            short_url,
        }),
    ))
}

/// Lists the authenticated user's links, newest first.
///
/// # Endpoint
///
/// `GET /api/links`
pub async fn list_links_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<LinkListResponse>, AppError> {
    let links = state.link_service.list(user.user_id).await?;

    Ok(Json(LinkListResponse {
        links: links.into_iter().map(LinkDto::from).collect(),
    }))
}

/// Partially updates an owned link.
///
/// # Endpoint
///
/// `PUT /api/links/{id}`
///
/// # Request Body
///
/// All fields are optional:
///
/// ```json
/// {
///   "originalUrl": "https://new-destination.com",
///   "customAlias": "new-alias",   // null or "" clears the alias
///   "isActive": false
/// }
/// ```
///
/// # Errors
///
/// - 400 malformed id or body, invalid URL or alias
/// - 404 link missing or owned by someone else
/// - 409 alias already taken
pub async fn update_link_handler(
    id: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<UpdateLinkRequest>, JsonRejection>,
) -> Result<Json<LinkResponse>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    payload.validate()?;

    let link = state
        .link_service
        .update(user.user_id, id, payload.into())
        .await?;

    Ok(Json(LinkResponse { link: link.into() }))
}

/// Deletes an owned link. Its analytics events are kept.
///
/// # Endpoint
///
/// `DELETE /api/links/{id}`
///
/// # Errors
///
/// Returns 400 for a malformed id and 404 if the link does not exist or is
/// owned by someone else.
pub async fn delete_link_handler(
    id: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = id?;
    state.link_service.delete(user.user_id, id).await?;

    Ok(Json(MessageResponse {
        message: "Link deleted".to_string(),
    }))
}
