//! Owner-scoped link management.

use std::sync::Arc;

use crate::domain::entities::{Link, LinkPatch, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::{DEFAULT_CODE_LENGTH, generate_code};
use crate::utils::validation::{is_reserved, validate_alias, validate_url};
use metrics::counter;
use serde_json::json;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info};

fn invalidate_retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(20)
        .max_delay(Duration::from_millis(500))
        .map(jitter)
        .take(3)
}

/// Short code generation parameters.
#[derive(Debug, Clone, Copy)]
pub struct CodeSettings {
    pub length: usize,
    pub max_attempts: usize,
}

impl Default for CodeSettings {
    fn default() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
            max_attempts: 10,
        }
    }
}

/// Service for creating, updating, deleting and listing an owner's links.
///
/// The store's token namespace is the authoritative uniqueness guard. The
/// existence checks here only produce friendlier errors and avoid pointless
/// inserts.
pub struct LinkService<L: LinkRepository + ?Sized> {
    repository: Arc<L>,
    cache: Arc<dyn CacheService>,
    settings: CodeSettings,
    base_url: String,
}

impl<L: LinkRepository + ?Sized> LinkService<L> {
    pub fn new(
        repository: Arc<L>,
        cache: Arc<dyn CacheService>,
        settings: CodeSettings,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            cache,
            settings,
            base_url: base_url.into(),
        }
    }

    /// Creates a link for `owner_id`.
    ///
    /// With a custom alias, the alias also becomes the link's short code.
    /// An empty alias counts as absent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL or alias is invalid.
    /// Returns [`AppError::Conflict`] if the alias is taken by any link.
    /// Returns [`AppError::Exhausted`] if no free code was found within the
    /// configured number of attempts.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn create(
        &self,
        owner_id: i64,
        original_url: &str,
        custom_alias: Option<String>,
    ) -> Result<Link, AppError> {
        validate_url(original_url)?;

        let custom_alias = custom_alias.filter(|alias| !alias.is_empty());

        let link = if let Some(alias) = custom_alias {
            validate_alias(&alias)?;

            if self.repository.token_exists(&alias).await? {
                return Err(alias_taken(&alias));
            }

            let new_link = NewLink {
                original_url: original_url.to_string(),
                short_code: alias.clone(),
                custom_alias: Some(alias),
                owner_id,
            };

            self.repository.create(new_link).await?
        } else {
            self.create_with_generated_code(owner_id, original_url)
                .await?
        };

        info!(
            link_id = link.id,
            owner_id,
            short_code = %link.short_code,
            "Link created"
        );

        Ok(link)
    }

    /// Applies a partial update to an owned link.
    ///
    /// `custom_alias: Some(None)` or `Some(Some(""))` clears the alias.
    /// Cached redirects for the link's previous tokens are invalidated.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist or belongs to
    /// another owner.
    /// Returns [`AppError::Validation`] if a supplied URL or alias is invalid.
    /// Returns [`AppError::Conflict`] if the new alias is taken by another link.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn update(
        &self,
        owner_id: i64,
        link_id: i64,
        mut patch: LinkPatch,
    ) -> Result<Link, AppError> {
        let current = self.find_owned(owner_id, link_id).await?;

        if let Some(url) = patch.original_url.as_deref() {
            validate_url(url)?;
        }

        patch.custom_alias = match patch.custom_alias.take() {
            Some(Some(alias)) if alias.is_empty() => Some(None),
            Some(Some(alias)) if current.custom_alias.as_deref() == Some(alias.as_str()) => None,
            Some(Some(alias)) => {
                validate_alias(&alias)?;

                if !current.answers_to(&alias) && self.repository.token_exists(&alias).await? {
                    return Err(alias_taken(&alias));
                }

                Some(Some(alias))
            }
            other => other,
        };

        let updated = self.repository.update(link_id, owner_id, patch).await?;
        self.invalidate_tokens(&current).await;

        info!(link_id, owner_id, "Link updated");

        Ok(updated)
    }

    /// Deletes an owned link and frees its tokens.
    ///
    /// Analytics events of the link are retained.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist or belongs to
    /// another owner.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn delete(&self, owner_id: i64, link_id: i64) -> Result<(), AppError> {
        let current = self.find_owned(owner_id, link_id).await?;

        if !self.repository.delete(link_id, owner_id).await? {
            return Err(link_not_found(link_id));
        }

        self.invalidate_tokens(&current).await;

        info!(link_id, owner_id, "Link deleted");

        Ok(())
    }

    /// Lists the owner's links, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn list(&self, owner_id: i64) -> Result<Vec<Link>, AppError> {
        self.repository.list_by_owner(owner_id).await
    }

    /// Constructs the public short URL of a link.
    pub fn short_url(&self, link: &Link) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), link.short_code)
    }

    async fn find_owned(&self, owner_id: i64, link_id: i64) -> Result<Link, AppError> {
        self.repository
            .find_owned(link_id, owner_id)
            .await?
            .ok_or_else(|| link_not_found(link_id))
    }

    /// Evicts every token of `link` from the cache, retrying failures.
    ///
    /// The store change is already committed, so a final failure is logged
    /// rather than returned.
    async fn invalidate_tokens(&self, link: &Link) {
        for token in link.tokens() {
            let cache = self.cache.clone();
            let evict = Retry::spawn(invalidate_retry_strategy(), move || {
                let cache = cache.clone();
                let token = token.to_string();
                async move { cache.invalidate(&token).await }
            });

            if let Err(e) = evict.await {
                counter!("cache_invalidate_failures_total").increment(1);
                error!(
                    link_id = link.id,
                    token,
                    error = %e,
                    "Failed to invalidate cached token"
                );
            }
        }
    }

    /// Generates codes until one is inserted.
    ///
    /// A code that is reserved or already taken costs an attempt, and so does
    /// an insert that loses a race for the code.
    async fn create_with_generated_code(
        &self,
        owner_id: i64,
        original_url: &str,
    ) -> Result<Link, AppError> {
        for attempt in 1..=self.settings.max_attempts {
            let code = generate_code(self.settings.length);

            if is_reserved(&code) || self.repository.token_exists(&code).await? {
                debug!(attempt, "Generated code collided, retrying");
                continue;
            }

            let new_link = NewLink {
                original_url: original_url.to_string(),
                short_code: code,
                custom_alias: None,
                owner_id,
            };

            match self.repository.create(new_link).await {
                Ok(link) => return Ok(link),
                Err(AppError::Conflict { .. }) => {
                    debug!(attempt, "Lost insert race for generated code, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::exhausted(
            "Failed to generate unique code",
            json!({ "attempts": self.settings.max_attempts }),
        ))
    }
}

fn alias_taken(alias: &str) -> AppError {
    AppError::conflict(
        "This alias is already taken",
        json!({ "customAlias": alias }),
    )
}

fn link_not_found(link_id: i64) -> AppError {
    AppError::not_found("Link not found", json!({ "id": link_id }))
}
