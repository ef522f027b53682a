//! Durable keyed counters backing the rate limiter.

use crate::error::AppError;
use async_trait::async_trait;

/// Atomic increment-and-read counter with expiry.
///
/// # Implementations
///
/// - [`crate::infrastructure::counter::RedisUsageCounter`] - `INCR` + `EXPIRE`
/// - [`crate::infrastructure::persistence::PgUsageCounter`] - upsert on `usage_counters`
/// - [`crate::infrastructure::memory::InMemoryUsageCounter`] - DashMap
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsageCounter: Send + Sync {
    /// Adds one to `key` and returns the new value.
    ///
    /// A key created by this call expires after `ttl_secs`. An expired key
    /// restarts from zero.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the backing store fails.
    async fn increment(&self, key: &str, ttl_secs: u64) -> Result<i64, AppError>;
}
