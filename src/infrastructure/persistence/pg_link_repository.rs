//! PostgreSQL implementation of link repository.
//!
//! The token namespace is the `link_tokens` table: one row per short code and
//! per distinct alias, keyed by the token. Every write that claims or releases
//! a token runs in the same transaction as the `links` write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;

use crate::domain::entities::{Link, LinkPatch, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    original_url: String,
    short_code: String,
    custom_alias: Option<String>,
    owner_id: i64,
    click_count: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LinkRow> for Link {
    fn from(r: LinkRow) -> Self {
        Link {
            id: r.id,
            original_url: r.original_url,
            short_code: r.short_code,
            custom_alias: r.custom_alias,
            owner_id: r.owner_id,
            click_count: r.click_count,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// PostgreSQL repository for links and their tokens.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn claim_token(
        tx: &mut Transaction<'_, Postgres>,
        token: &str,
        link_id: i64,
    ) -> Result<(), AppError> {
        sqlx::query("INSERT INTO link_tokens (token, link_id) VALUES ($1, $2)")
            .bind(token)
            .bind(link_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            INSERT INTO links (original_url, short_code, custom_alias, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, original_url, short_code, custom_alias, owner_id,
                      click_count, is_active, created_at, updated_at
            "#,
        )
        .bind(&new_link.original_url)
        .bind(&new_link.short_code)
        .bind(&new_link.custom_alias)
        .bind(new_link.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        for token in new_link.tokens() {
            Self::claim_token(&mut tx, token, row.id).await?;
        }

        tx.commit().await?;

        Ok(row.into())
    }

    async fn find_active_by_token(&self, token: &str) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT l.id, l.original_url, l.short_code, l.custom_alias, l.owner_id,
                   l.click_count, l.is_active, l.created_at, l.updated_at
            FROM link_tokens t
            JOIN links l ON l.id = t.link_id
            WHERE t.token = $1 AND l.is_active
            "#,
        )
        .bind(token)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT l.id, l.original_url, l.short_code, l.custom_alias, l.owner_id,
                   l.click_count, l.is_active, l.created_at, l.updated_at
            FROM link_tokens t
            JOIN links l ON l.id = t.link_id
            WHERE t.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn token_exists(&self, token: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM link_tokens WHERE token = $1)",
        )
        .bind(token)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(exists)
    }

    async fn find_owned(&self, id: i64, owner_id: i64) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id, original_url, short_code, custom_alias, owner_id,
                   click_count, is_active, created_at, updated_at
            FROM links
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Link>, AppError> {
        let rows = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id, original_url, short_code, custom_alias, owner_id,
                   click_count, is_active, created_at, updated_at
            FROM links
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn update(&self, id: i64, owner_id: i64, patch: LinkPatch) -> Result<Link, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id, original_url, short_code, custom_alias, owner_id,
                   click_count, is_active, created_at, updated_at
            FROM links
            WHERE id = $1 AND owner_id = $2
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        let alias_changed = patch.custom_alias.is_some();
        if let Some(new_alias) = &patch.custom_alias {
            if let Some(old) = current.custom_alias.as_deref()
                && old != current.short_code
                && Some(old) != new_alias.as_deref()
            {
                sqlx::query("DELETE FROM link_tokens WHERE token = $1 AND link_id = $2")
                    .bind(old)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }

            if let Some(alias) = new_alias.as_deref()
                && alias != current.short_code
                && current.custom_alias.as_deref() != Some(alias)
            {
                Self::claim_token(&mut tx, alias, id).await?;
            }
        }

        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            UPDATE links
            SET original_url = COALESCE($3::text, original_url),
                custom_alias = CASE WHEN $4::boolean THEN $5::text ELSE custom_alias END,
                is_active    = COALESCE($6::boolean, is_active),
                updated_at   = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, original_url, short_code, custom_alias, owner_id,
                      click_count, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(patch.original_url)
        .bind(alias_changed)
        .bind(patch.custom_alias.flatten())
        .bind(patch.is_active)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_click_count(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE links SET click_count = click_count + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
