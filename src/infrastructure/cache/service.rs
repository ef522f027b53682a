//! Cache service trait and error types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// What the redirect path needs to answer a token without the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedLink {
    pub link_id: i64,
    pub original_url: String,
}

/// Trait for caching token -> link mappings of active links.
///
/// Implementations must be thread-safe and fail open: a cache failure degrades
/// to a store lookup and never fails the request.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Looks up a token.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(link))` on cache hit
    /// - `Ok(None)` on cache miss or error (fail-open behavior)
    ///
    /// # Errors
    ///
    /// Should not return errors in production implementations. Errors are logged
    /// and treated as cache misses.
    async fn get_link(&self, token: &str) -> CacheResult<Option<CachedLink>>;

    /// Stores a token mapping, using the implementation's default TTL when
    /// `ttl_seconds` is `None`.
    ///
    /// # Errors
    ///
    /// Should not propagate errors to callers.
    async fn set_link(
        &self,
        token: &str,
        link: &CachedLink,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    /// Removes a cached token mapping.
    ///
    /// Used when a link is updated, disabled or deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry may still be present, so the caller can
    /// retry. A missing entry is not an error.
    async fn invalidate(&self, token: &str) -> CacheResult<()>;

    /// Returns false for backends that never store anything.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_link_wire_format() {
        let link = CachedLink {
            link_id: 3,
            original_url: "https://example.com".to_string(),
        };

        let json = serde_json::to_string(&link).unwrap();

        assert_eq!(json, r#"{"linkId":3,"originalUrl":"https://example.com"}"#);
        assert_eq!(serde_json::from_str::<CachedLink>(&json).unwrap(), link);
    }
}
