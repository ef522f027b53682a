//! Token resolution for the public redirect route.

use std::sync::Arc;

use crate::domain::click_event::ClickEvent;
use crate::domain::click_worker::ClickQueue;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheService, CachedLink};
use serde_json::json;
use tracing::{debug, error, warn};

/// Request metadata captured for analytics.
#[derive(Debug, Clone, Default)]
pub struct VisitContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// Where a visitor should be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectTarget {
    pub link_id: i64,
    pub original_url: String,
}

impl From<CachedLink> for RedirectTarget {
    fn from(cached: CachedLink) -> Self {
        Self {
            link_id: cached.link_id,
            original_url: cached.original_url,
        }
    }
}

/// Resolves tokens to active links and hands each visit to the click queue.
pub struct RedirectService<L: LinkRepository + ?Sized> {
    repository: Arc<L>,
    cache: Arc<dyn CacheService>,
    click_queue: ClickQueue,
}

impl<L: LinkRepository + ?Sized> RedirectService<L> {
    pub fn new(repository: Arc<L>, cache: Arc<dyn CacheService>, click_queue: ClickQueue) -> Self {
        Self {
            repository,
            cache,
            click_queue,
        }
    }

    /// Resolves `token` and schedules the click to be recorded.
    ///
    /// The click is dispatched without waiting for it to be written; the
    /// returned target is the same whether or not the write later succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no active link answers to `token`.
    /// Returns [`AppError::Internal`] if the store lookup fails.
    pub async fn resolve(
        &self,
        token: &str,
        visit: VisitContext,
    ) -> Result<RedirectTarget, AppError> {
        let target = self.lookup(token).await?;

        self.click_queue.dispatch(ClickEvent::new(
            target.link_id,
            token.to_string(),
            visit.ip,
            visit.user_agent.as_deref(),
            visit.referrer.as_deref(),
        ));

        Ok(target)
    }

    async fn lookup(&self, token: &str) -> Result<RedirectTarget, AppError> {
        if let Ok(Some(cached)) = self.cache.get_link(token).await {
            return Ok(cached.into());
        }

        let link = self
            .repository
            .find_active_by_token(token)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "token": token })))?;

        let cached = CachedLink {
            link_id: link.id,
            original_url: link.original_url,
        };

        self.fill_cache(token, &cached).await;

        Ok(cached.into())
    }

    /// Caches `entry`, then re-reads the store and evicts the entry again if
    /// the link changed in between.
    ///
    /// An update or delete that invalidated `token` while the write was in
    /// flight would otherwise be overwritten by the stale entry.
    async fn fill_cache(&self, token: &str, entry: &CachedLink) {
        if !self.cache.is_enabled() {
            return;
        }

        if self.cache.set_link(token, entry, None).await.is_err() {
            debug!("Failed to cache token {}", token);
            return;
        }

        let current = match self.repository.find_active_by_token(token).await {
            Ok(current) => current,
            Err(e) => {
                warn!(token, error = %e, "Could not verify cached token, evicting");
                None
            }
        };

        let unchanged = current.is_some_and(|link| {
            link.id == entry.link_id && link.original_url == entry.original_url
        });

        if unchanged {
            return;
        }

        if let Err(e) = self.cache.invalidate(token).await {
            error!(token, error = %e, "Failed to evict stale cache entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{CodeSettings, LinkService};
    use crate::domain::click_worker::ClickRecorder;
    use crate::domain::entities::Link;
    use crate::domain::repositories::{MockAnalyticsRepository, MockLinkRepository};
    use crate::infrastructure::cache::{MockCacheService, NullCache};
    use crate::infrastructure::memory::InMemoryLinkRepository;
    use chrono::Utc;
    use tokio::sync::mpsc;

    fn active_link(id: i64, short_code: &str) -> Link {
        let now = Utc::now();
        Link {
            id,
            original_url: "https://example.com/target".to_string(),
            short_code: short_code.to_string(),
            custom_alias: None,
            owner_id: 1,
            click_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn queue() -> (ClickQueue, mpsc::Receiver<ClickEvent>) {
        let recorder = ClickRecorder::new(
            Arc::new(MockAnalyticsRepository::new()),
            Arc::new(MockLinkRepository::new()),
        );
        ClickQueue::new(16, Arc::new(recorder))
    }

    #[tokio::test]
    async fn test_resolve_dispatches_click() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_active_by_token()
            .withf(|t| t == "abc123")
            .times(1)
            .returning(|t| Ok(Some(active_link(42, t))));

        let (queue, mut rx) = queue();
        let service = RedirectService::new(Arc::new(repo), Arc::new(NullCache::new()), queue);

        let visit = VisitContext {
            ip: Some("203.0.113.7".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
            referrer: Some("https://news.example".to_string()),
        };

        let target = service.resolve("abc123", visit).await.unwrap();

        assert_eq!(target.link_id, 42);
        assert_eq!(target.original_url, "https://example.com/target");

        let event = rx.try_recv().unwrap();
        assert_eq!(event.link_id, 42);
        assert_eq!(event.token, "abc123");
        assert_eq!(event.ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(event.referrer.as_deref(), Some("https://news.example"));
    }

    #[tokio::test]
    async fn test_resolve_unknown_token() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_active_by_token()
            .times(1)
            .returning(|_| Ok(None));

        let (queue, mut rx) = queue();
        let service = RedirectService::new(Arc::new(repo), Arc::new(NullCache::new()), queue);

        let result = service.resolve("missing", VisitContext::default()).await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resolve_store_failure_is_internal() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_active_by_token()
            .times(1)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let (queue, mut rx) = queue();
        let service = RedirectService::new(Arc::new(repo), Arc::new(NullCache::new()), queue);

        let result = service.resolve("abc123", VisitContext::default()).await;

        assert!(matches!(result, Err(AppError::Internal { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resolve_cache_hit_skips_store() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_active_by_token().times(0);

        let mut cache = MockCacheService::new();
        cache.expect_get_link().times(1).returning(|_| {
            Ok(Some(CachedLink {
                link_id: 7,
                original_url: "https://cached.example".to_string(),
            }))
        });

        let (queue, mut rx) = queue();
        let service = RedirectService::new(Arc::new(repo), Arc::new(cache), queue);

        let target = service
            .resolve("promo", VisitContext::default())
            .await
            .unwrap();

        assert_eq!(target.original_url, "https://cached.example");
        assert_eq!(rx.try_recv().unwrap().link_id, 7);
    }

    #[tokio::test]
    async fn test_resolve_cache_error_falls_back_to_store() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_active_by_token()
            .times(2)
            .returning(|t| Ok(Some(active_link(3, t))));

        let mut cache = MockCacheService::new();
        cache.expect_get_link().returning(|_| {
            Err(crate::infrastructure::cache::CacheError::OperationError(
                "down".to_string(),
            ))
        });
        cache.expect_is_enabled().return_const(true);
        cache.expect_set_link().returning(|_, _, _| Ok(()));
        cache.expect_invalidate().times(0);

        let (queue, _rx) = queue();
        let service = RedirectService::new(Arc::new(repo), Arc::new(cache), queue);

        let target = service
            .resolve("abc123", VisitContext::default())
            .await
            .unwrap();

        assert_eq!(target.link_id, 3);
    }

    /// Cache whose writes land late, like a slow network round trip.
    struct SlowSetCache {
        entries: dashmap::DashMap<String, CachedLink>,
        delay: std::time::Duration,
    }

    impl SlowSetCache {
        fn new(delay_ms: u64) -> Self {
            Self {
                entries: dashmap::DashMap::new(),
                delay: std::time::Duration::from_millis(delay_ms),
            }
        }
    }

    #[async_trait::async_trait]
    impl CacheService for SlowSetCache {
        async fn get_link(
            &self,
            token: &str,
        ) -> crate::infrastructure::cache::CacheResult<Option<CachedLink>> {
            Ok(self.entries.get(token).map(|entry| entry.clone()))
        }

        async fn set_link(
            &self,
            token: &str,
            link: &CachedLink,
            _ttl: Option<u64>,
        ) -> crate::infrastructure::cache::CacheResult<()> {
            tokio::time::sleep(self.delay).await;
            self.entries.insert(token.to_string(), link.clone());
            Ok(())
        }

        async fn invalidate(&self, token: &str) -> crate::infrastructure::cache::CacheResult<()> {
            self.entries.remove(token);
            Ok(())
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn deactivate() -> crate::domain::entities::LinkPatch {
        crate::domain::entities::LinkPatch {
            is_active: Some(false),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_deactivated_link_stops_resolving_with_slow_cache() {
        let repo = Arc::new(InMemoryLinkRepository::new());
        let cache: Arc<dyn CacheService> = Arc::new(SlowSetCache::new(50));
        let links = LinkService::new(
            repo.clone(),
            cache.clone(),
            CodeSettings::default(),
            "https://s.example.com",
        );
        let (queue, _rx) = queue();
        let redirects = RedirectService::new(repo, cache, queue);

        let link = links
            .create(1, "https://example.com", Some("promo".to_string()))
            .await
            .unwrap();

        let target = redirects
            .resolve("promo", VisitContext::default())
            .await
            .unwrap();
        assert_eq!(target.original_url, "https://example.com");

        links.update(1, link.id, deactivate()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;

        let result = redirects.resolve("promo", VisitContext::default()).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_deactivation_during_cache_fill_evicts_entry() {
        let repo = Arc::new(InMemoryLinkRepository::new());
        let cache: Arc<dyn CacheService> = Arc::new(SlowSetCache::new(100));
        let links = LinkService::new(
            repo.clone(),
            cache.clone(),
            CodeSettings::default(),
            "https://s.example.com",
        );
        let (queue, _rx) = queue();
        let redirects = Arc::new(RedirectService::new(repo, cache.clone(), queue));

        let link = links
            .create(1, "https://example.com", Some("promo".to_string()))
            .await
            .unwrap();

        let resolving = {
            let redirects = redirects.clone();
            tokio::spawn(async move { redirects.resolve("promo", VisitContext::default()).await })
        };

        // Deactivate while the resolver's cache write is still in flight.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        links.update(1, link.id, deactivate()).await.unwrap();

        assert!(resolving.await.unwrap().is_ok());
        assert!(cache.get_link("promo").await.unwrap().is_none());

        let result = redirects.resolve("promo", VisitContext::default()).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }
}
