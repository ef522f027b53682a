//! DTOs for the link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{Link, LinkPatch};

/// Request body for `POST /api/links`.
///
/// URL and alias rules are enforced by the link service so that the HTTP API
/// and any other caller share one set of messages.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "originalUrl is required"))]
    pub original_url: String,

    /// Optional alias. An empty string counts as absent.
    pub custom_alias: Option<String>,
}

/// Request body for `PUT /api/links/{id}`.
///
/// Only supplied fields change.
///
/// # `customAlias` semantics
///
/// - **Absent** → leave the alias unchanged
/// - **`null`** or **`""`** → clear the alias
/// - **String** → set a new alias
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinkRequest {
    #[validate(length(min = 1, message = "originalUrl must not be empty"))]
    pub original_url: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub custom_alias: Option<Option<String>>,

    pub is_active: Option<bool>,
}

impl From<UpdateLinkRequest> for LinkPatch {
    fn from(req: UpdateLinkRequest) -> Self {
        Self {
            original_url: req.original_url,
            custom_alias: req.custom_alias,
            is_active: req.is_active,
        }
    }
}

/// JSON representation of a link.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDto {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub owner_id: i64,
    pub click_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Link> for LinkDto {
    fn from(link: Link) -> Self {
        Self {
            id: link.id,
            original_url: link.original_url,
            short_code: link.short_code,
            custom_alias: link.custom_alias,
            owner_id: link.owner_id,
            click_count: link.click_count,
            is_active: link.is_active,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

/// Response of `POST /api/links`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkResponse {
    pub link: LinkDto,
    pub short_url: String,
}

/// Response of `GET /api/links`.
#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub links: Vec<LinkDto>,
}

/// Response of `PUT /api/links/{id}`.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub link: LinkDto,
}

/// Plain confirmation message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
