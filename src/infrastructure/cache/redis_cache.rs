//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService, CachedLink};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, error, warn};

/// Redis cache for fast token lookups.
///
/// Uses `ConnectionManager` for connection reuse and reconnects. Values are
/// JSON-encoded [`CachedLink`]s. Reads and writes are fail-open: errors are
/// logged but don't propagate to callers. A failed invalidation is returned,
/// since a surviving entry would keep serving a dead link.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Builds a cache over an existing connection.
    pub fn from_manager(manager: ConnectionManager, default_ttl_seconds: u64) -> Self {
        Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "link:".to_string(),
        }
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, token: &str) -> String {
        format!("{}{}", self.key_prefix, token)
    }
}

/// Opens a managed connection and checks it with a PING.
///
/// # Errors
///
/// Returns [`CacheError::ConnectionError`] on any failure.
pub async fn connect_manager(redis_url: &str) -> CacheResult<ConnectionManager> {
    let client = Client::open(redis_url).map_err(|e| {
        CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
    })?;

    let manager = ConnectionManager::new(client)
        .await
        .map_err(|e| CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e)))?;

    let mut test_conn = manager.clone();
    test_conn
        .ping::<()>()
        .await
        .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

    Ok(manager)
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_link(&self, token: &str) -> CacheResult<Option<CachedLink>> {
        let key = self.build_key(token);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<CachedLink>(&raw) {
                Ok(link) => {
                    debug!("Cache HIT: {} -> {}", token, link.original_url);
                    Ok(Some(link))
                }
                Err(e) => {
                    warn!("Discarding malformed cache entry for {}: {}", token, e);
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!("Cache MISS: {}", token);
                Ok(None)
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", token, e);
                Ok(None)
            }
        }
    }

    async fn set_link(
        &self,
        token: &str,
        link: &CachedLink,
        ttl: Option<u64>,
    ) -> CacheResult<()> {
        let key = self.build_key(token);
        let mut conn = self.client.clone();
        let ttl_seconds = ttl.unwrap_or(self.default_ttl);

        let value = serde_json::to_string(link)
            .map_err(|e| CacheError::OperationError(e.to_string()))?;

        match conn.set_ex::<_, _, ()>(&key, value, ttl_seconds).await {
            Ok(_) => {
                debug!(
                    "Cache SET: {} -> {} (TTL: {}s)",
                    token, link.original_url, ttl_seconds
                );
                Ok(())
            }
            Err(e) => {
                warn!("Redis SET error for {}: {}", token, e);
                Ok(())
            }
        }
    }

    async fn invalidate(&self, token: &str) -> CacheResult<()> {
        let key = self.build_key(token);
        let mut conn = self.client.clone();

        match conn.del::<_, i32>(&key).await {
            Ok(deleted) => {
                if deleted > 0 {
                    debug!("Cache INVALIDATE: {}", token);
                }
                Ok(())
            }
            Err(e) => Err(CacheError::OperationError(format!(
                "Redis DEL failed for {}: {}",
                token, e
            ))),
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
