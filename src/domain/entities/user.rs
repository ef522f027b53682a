//! User entity.
//!
//! Users come from an external identity provider. They are stored only so
//! that links and API tokens have an owner.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub provider_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input data for registering a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub provider_id: String,
}

impl NewUser {
    /// Emails are unique case-insensitively, so they are stored lowercased.
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_lowercase();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_lowercases_email() {
        let user = NewUser {
            name: "Ada".to_string(),
            email: "  Ada@Example.COM ".to_string(),
            image: None,
            provider_id: "google-123".to_string(),
        }
        .normalized();

        assert_eq!(user.email, "ada@example.com");
    }
}
