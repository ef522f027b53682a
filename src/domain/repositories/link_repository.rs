//! Repository trait for short link data access.

use crate::domain::entities::{Link, LinkPatch, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for managing short links.
///
/// Every implementation keeps one global token namespace fed by both short
/// codes and custom aliases. A token resolves to at most one link, and the
/// namespace itself rejects a duplicate, so concurrent creators racing for the
/// same token see exactly one winner.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::InMemoryLinkRepository`] - DashMap implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new active link with a zero click count.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if any of the link's tokens is already
    /// taken by another link.
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds the active link answering to `token`.
    ///
    /// Inactive links are never returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_active_by_token(&self, token: &str) -> Result<Option<Link>, AppError>;

    /// Finds the link answering to `token`, active or not.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_token(&self, token: &str) -> Result<Option<Link>, AppError>;

    /// Returns true if any link (active or not) owns `token`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn token_exists(&self, token: &str) -> Result<bool, AppError>;

    /// Finds a link by id, only if it belongs to `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_owned(&self, id: i64, owner_id: i64) -> Result<Option<Link>, AppError>;

    /// Lists all links of an owner, newest first, ties broken by id descending.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Link>, AppError>;

    /// Partially updates an owned link and refreshes `updated_at`.
    ///
    /// Only fields present in [`LinkPatch`] are modified. Changing the alias
    /// releases the old alias token and claims the new one atomically.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link matches `id` + `owner_id`.
    /// Returns [`AppError::Conflict`] if the new alias is taken by another link.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn update(&self, id: i64, owner_id: i64, patch: LinkPatch) -> Result<Link, AppError>;

    /// Hard-deletes an owned link and frees its tokens.
    ///
    /// Returns `Ok(true)` if the link was deleted, `Ok(false)` if it does not
    /// exist or belongs to someone else.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, AppError>;

    /// Atomically adds one to the link's click counter.
    ///
    /// A missing link is not an error; the visit raced a deletion.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn increment_click_count(&self, id: i64) -> Result<(), AppError>;

    /// Checks that the backing store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the store cannot be reached.
    async fn ping(&self) -> Result<(), AppError>;
}
