use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::json;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::entities::{Link, LinkPatch, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// In-memory link store using DashMap.
///
/// `tokens` is the namespace: one entry per short code and alias, claimed
/// through the entry API so two concurrent claims of a token cannot both win.
/// Guards on `tokens` are never held while locking `links`.
#[derive(Debug, Default)]
pub struct InMemoryLinkRepository {
    links: DashMap<i64, Link>,
    tokens: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current click counter of a link.
    pub fn click_count(&self, link_id: i64) -> Option<i64> {
        self.links.get(&link_id).map(|l| l.click_count)
    }

    fn claim(&self, token: &str, link_id: i64) -> Result<(), AppError> {
        match self.tokens.entry(token.to_string()) {
            Entry::Occupied(_) => Err(AppError::conflict(
                "This alias is already taken",
                json!({ "token": token }),
            )),
            Entry::Vacant(slot) => {
                slot.insert(link_id);
                Ok(())
            }
        }
    }

    fn release(&self, token: &str, link_id: i64) {
        self.tokens.remove_if(token, |_, owner| *owner == link_id);
    }

    fn lookup(&self, token: &str) -> Option<Link> {
        let link_id = *self.tokens.get(token)?;
        self.links.get(&link_id).map(|l| l.clone())
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;

        let tokens = new_link.tokens();
        for (i, token) in tokens.iter().enumerate() {
            if let Err(e) = self.claim(token, id) {
                for claimed in &tokens[..i] {
                    self.release(claimed, id);
                }
                return Err(e);
            }
        }

        let now = Utc::now();
        let link = Link {
            id,
            original_url: new_link.original_url,
            short_code: new_link.short_code,
            custom_alias: new_link.custom_alias,
            owner_id: new_link.owner_id,
            click_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.links.insert(id, link.clone());
        Ok(link)
    }

    async fn find_active_by_token(&self, token: &str) -> Result<Option<Link>, AppError> {
        Ok(self.lookup(token).filter(|l| l.is_active))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Link>, AppError> {
        Ok(self.lookup(token))
    }

    async fn token_exists(&self, token: &str) -> Result<bool, AppError> {
        Ok(self.tokens.contains_key(token))
    }

    async fn find_owned(&self, id: i64, owner_id: i64) -> Result<Option<Link>, AppError> {
        Ok(self
            .links
            .get(&id)
            .filter(|l| l.owner_id == owner_id)
            .map(|l| l.clone()))
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Link>, AppError> {
        let mut links: Vec<Link> = self
            .links
            .iter()
            .filter(|l| l.owner_id == owner_id)
            .map(|l| l.clone())
            .collect();

        links.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(links)
    }

    async fn update(&self, id: i64, owner_id: i64, patch: LinkPatch) -> Result<Link, AppError> {
        let mut link = match self.links.get_mut(&id) {
            Some(link) if link.owner_id == owner_id => link,
            _ => return Err(AppError::not_found("Link not found", json!({ "id": id }))),
        };

        if let Some(new_alias) = patch.custom_alias {
            let old_alias = link.custom_alias.clone();

            if let Some(alias) = new_alias.as_deref()
                && alias != link.short_code
                && old_alias.as_deref() != Some(alias)
            {
                self.claim(alias, id)?;
            }

            if let Some(old) = old_alias.as_deref()
                && old != link.short_code
                && Some(old) != new_alias.as_deref()
            {
                self.release(old, id);
            }

            link.custom_alias = new_alias;
        }

        if let Some(url) = patch.original_url {
            link.original_url = url;
        }
        if let Some(active) = patch.is_active {
            link.is_active = active;
        }
        link.updated_at = Utc::now();

        Ok(link.clone())
    }

    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, AppError> {
        let Some((_, link)) = self.links.remove_if(&id, |_, l| l.owner_id == owner_id) else {
            return Ok(false);
        };

        for token in link.tokens() {
            self.release(token, id);
        }

        Ok(true)
    }

    async fn increment_click_count(&self, id: i64) -> Result<(), AppError> {
        if let Some(mut link) = self.links.get_mut(&id) {
            link.click_count += 1;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
