//! PostgreSQL implementation of the analytics repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{AnalyticsEvent, NewAnalyticsEvent};
use crate::domain::repositories::AnalyticsRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct EventRow {
    id: i64,
    link_id: i64,
    short_code: String,
    occurred_at: DateTime<Utc>,
    user_agent: String,
    browser: Option<String>,
    device: Option<String>,
    os: Option<String>,
    ip_address: Option<String>,
    referrer: Option<String>,
}

impl From<EventRow> for AnalyticsEvent {
    fn from(r: EventRow) -> Self {
        AnalyticsEvent {
            id: r.id,
            link_id: r.link_id,
            short_code: r.short_code,
            occurred_at: r.occurred_at,
            user_agent: r.user_agent,
            browser: r.browser,
            device: r.device,
            os: r.os,
            ip_address: r.ip_address,
            referrer: r.referrer,
        }
    }
}

/// PostgreSQL repository for the `analytics_events` log.
pub struct PgAnalyticsRepository {
    pool: Arc<PgPool>,
}

impl PgAnalyticsRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsRepository for PgAnalyticsRepository {
    /// Inserts the event, or returns the stored one if its key was already
    /// recorded by an earlier attempt.
    async fn record(&self, event: NewAnalyticsEvent) -> Result<AnalyticsEvent, AppError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            WITH inserted AS (
                INSERT INTO analytics_events
                    (event_key, link_id, short_code, occurred_at, user_agent,
                     browser, device, os, ip_address, referrer)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (event_key) DO NOTHING
                RETURNING id, link_id, short_code, occurred_at, user_agent,
                          browser, device, os, ip_address, referrer
            )
            SELECT * FROM inserted
            UNION ALL
            SELECT id, link_id, short_code, occurred_at, user_agent,
                   browser, device, os, ip_address, referrer
            FROM analytics_events
            WHERE event_key = $1
            LIMIT 1
            "#,
        )
        .bind(event.event_key)
        .bind(event.link_id)
        .bind(event.short_code)
        .bind(event.occurred_at)
        .bind(event.user_agent)
        .bind(event.browser)
        .bind(event.device)
        .bind(event.os)
        .bind(event.ip_address)
        .bind(event.referrer)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn recent_for_link(
        &self,
        link_id: i64,
        limit: i64,
    ) -> Result<Vec<AnalyticsEvent>, AppError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, link_id, short_code, occurred_at, user_agent,
                   browser, device, os, ip_address, referrer
            FROM analytics_events
            WHERE link_id = $1
            ORDER BY occurred_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(link_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(AnalyticsEvent::from).collect())
    }
}
