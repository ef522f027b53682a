use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::json;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::repositories::{ApiToken, TokenRepository};
use crate::error::AppError;

/// In-memory API token store keyed by token id.
#[derive(Debug, Default)]
pub struct InMemoryTokenRepository {
    tokens: DashMap<i64, ApiToken>,
    next_id: AtomicI64,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, predicate: impl Fn(&ApiToken) -> bool) -> Option<ApiToken> {
        self.tokens
            .iter()
            .filter(|t| predicate(t.value()))
            .max_by_key(|t| t.id)
            .map(|t| t.value().clone())
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn validate_token(&self, token_hash: &str) -> Result<Option<i64>, AppError> {
        Ok(self
            .find(|t| t.token_hash == token_hash && !t.is_revoked())
            .map(|t| t.user_id))
    }

    async fn update_last_used(&self, token_hash: &str) -> Result<(), AppError> {
        for mut token in self.tokens.iter_mut() {
            if token.token_hash == token_hash && !token.is_revoked() {
                token.last_used_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn create_token(
        &self,
        user_id: i64,
        name: &str,
        token_hash: &str,
    ) -> Result<ApiToken, AppError> {
        if self.tokens.iter().any(|t| t.token_hash == token_hash) {
            return Err(AppError::conflict(
                "Token already exists",
                json!({ "name": name }),
            ));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let token = ApiToken {
            id,
            user_id,
            name: name.to_string(),
            token_hash: token_hash.to_string(),
            created_at: Utc::now(),
            last_used_at: None,
            revoked_at: None,
        };

        self.tokens.insert(id, token.clone());
        Ok(token)
    }

    async fn list_tokens(&self) -> Result<Vec<ApiToken>, AppError> {
        let mut tokens: Vec<ApiToken> = self.tokens.iter().map(|t| t.value().clone()).collect();
        tokens.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(tokens)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ApiToken>, AppError> {
        Ok(self.tokens.get(&id).map(|t| t.value().clone()))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ApiToken>, AppError> {
        Ok(self.find(|t| t.name == name))
    }

    async fn revoke_token(&self, id: i64) -> Result<(), AppError> {
        match self.tokens.get_mut(&id) {
            Some(mut token) if !token.is_revoked() => {
                token.revoked_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(AppError::not_found(
                "Token not found or already revoked",
                json!({ "id": id }),
            )),
        }
    }
}
