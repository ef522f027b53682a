//! PostgreSQL-backed usage counter, used when Redis is not configured.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repositories::UsageCounter;
use crate::error::AppError;

/// Counter rows in `usage_counters`, incremented with a single upsert.
///
/// An expired row is reset in the same statement, so the read-modify-write
/// stays atomic under concurrent callers.
pub struct PgUsageCounter {
    pool: Arc<PgPool>,
}

impl PgUsageCounter {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Deletes expired counters. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM usage_counters WHERE expires_at <= NOW()")
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl UsageCounter for PgUsageCounter {
    async fn increment(&self, key: &str, ttl_secs: u64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO usage_counters (key, count, expires_at)
            VALUES ($1, 1, NOW() + make_interval(secs => $2::double precision))
            ON CONFLICT (key) DO UPDATE SET
                count = CASE
                    WHEN usage_counters.expires_at <= NOW() THEN 1
                    ELSE usage_counters.count + 1
                END,
                expires_at = CASE
                    WHEN usage_counters.expires_at <= NOW() THEN EXCLUDED.expires_at
                    ELSE usage_counters.expires_at
                END
            RETURNING count
            "#,
        )
        .bind(key)
        .bind(ttl_secs as f64)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }
}
