//! Link entity representing one shortening mapping.

use chrono::{DateTime, Utc};

/// A short link owned by a user.
///
/// A link answers to its `short_code` and, when set, to its `custom_alias`.
/// Both live in one global token namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub owner_id: i64,
    pub click_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Link {
    /// Tokens this link resolves from, short code first.
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens = vec![self.short_code.as_str()];
        if let Some(alias) = self.custom_alias.as_deref()
            && alias != self.short_code
        {
            tokens.push(alias);
        }
        tokens
    }

    /// Returns true if `token` is this link's short code or alias.
    pub fn answers_to(&self, token: &str) -> bool {
        self.short_code == token || self.custom_alias.as_deref() == Some(token)
    }
}

/// Input data for creating a new link.
///
/// New links start active with a zero click count.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub original_url: String,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub owner_id: i64,
}

impl NewLink {
    /// Tokens the new link will claim in the namespace.
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens = vec![self.short_code.as_str()];
        if let Some(alias) = self.custom_alias.as_deref()
            && alias != self.short_code
        {
            tokens.push(alias);
        }
        tokens
    }
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged.
/// `custom_alias: Some(None)` clears the alias; `Some(Some(a))` sets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPatch {
    pub original_url: Option<String>,
    pub custom_alias: Option<Option<String>>,
    pub is_active: Option<bool>,
}
