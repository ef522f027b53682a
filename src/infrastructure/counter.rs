//! Redis-backed usage counter for the rate limiter.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde_json::json;
use tracing::error;

use crate::domain::repositories::UsageCounter;
use crate::error::AppError;

/// Counts with `INCR` and sets the expiry with `EXPIRE ... NX` in one atomic
/// pipeline, so only the call that creates the key sets its lifetime.
pub struct RedisUsageCounter {
    client: ConnectionManager,
}

impl RedisUsageCounter {
    pub fn new(client: ConnectionManager) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UsageCounter for RedisUsageCounter {
    async fn increment(&self, key: &str, ttl_secs: u64) -> Result<i64, AppError> {
        let mut conn = self.client.clone();

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs)
            .arg("NX")
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!(key, error = %e, "Redis usage counter failed");
                AppError::internal("Rate limit counter unavailable", json!({}))
            })?;

        Ok(count)
    }
}
