//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{
    AnalyticsService, AuthService, CodeSettings, LinkService, RateLimitService, RedirectService,
};
use crate::domain::click_worker::ClickQueue;
use crate::domain::repositories::{
    AnalyticsRepository, LinkRepository, TokenRepository, UsageCounter,
};
use crate::infrastructure::cache::CacheService;

/// Storage backends the services are built on.
#[derive(Clone)]
pub struct Repositories {
    pub links: Arc<dyn LinkRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub usage: Arc<dyn UsageCounter>,
}

/// Settings consumed when building the services.
#[derive(Debug, Clone)]
pub struct StateSettings {
    /// Public base URL short links are built from.
    pub base_url: String,
    pub token_signing_secret: String,
    pub rate_limit_per_day: u32,
    pub code: CodeSettings,
    /// Trust `X-Forwarded-For` / `X-Real-IP` for visitor IPs.
    pub behind_proxy: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn LinkRepository>>,
    pub redirect_service: Arc<RedirectService<dyn LinkRepository>>,
    pub analytics_service: Arc<AnalyticsService<dyn LinkRepository, dyn AnalyticsRepository>>,
    pub auth_service: Arc<AuthService<dyn TokenRepository>>,
    pub rate_limit_service: Arc<RateLimitService<dyn UsageCounter>>,
    /// Used directly by the health check.
    pub link_repository: Arc<dyn LinkRepository>,
    pub cache: Arc<dyn CacheService>,
    pub click_queue: ClickQueue,
    pub behind_proxy: bool,
    pub base_url: String,
}

impl AppState {
    pub fn new(
        repositories: Repositories,
        cache: Arc<dyn CacheService>,
        click_queue: ClickQueue,
        settings: StateSettings,
    ) -> Self {
        let Repositories {
            links,
            analytics,
            tokens,
            usage,
        } = repositories;

        let link_service = Arc::new(LinkService::new(
            links.clone(),
            cache.clone(),
            settings.code,
            settings.base_url.clone(),
        ));
        let redirect_service = Arc::new(RedirectService::new(
            links.clone(),
            cache.clone(),
            click_queue.clone(),
        ));
        let analytics_service = Arc::new(AnalyticsService::new(links.clone(), analytics));
        let auth_service = Arc::new(AuthService::new(tokens, settings.token_signing_secret));
        let rate_limit_service = Arc::new(RateLimitService::new(usage, settings.rate_limit_per_day));

        Self {
            link_service,
            redirect_service,
            analytics_service,
            auth_service,
            rate_limit_service,
            link_repository: links,
            cache,
            click_queue,
            behind_proxy: settings.behind_proxy,
            base_url: settings.base_url,
        }
    }
}
