//! Per-link click analytics.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::entities::{AnalyticsEvent, Link};
use crate::domain::repositories::{AnalyticsRepository, LinkRepository};
use crate::error::AppError;
use serde_json::json;

/// Number of most recent events the breakdowns are computed over.
pub const RECENT_EVENTS_LIMIT: i64 = 100;

/// Summary of one link's traffic.
///
/// `total_clicks` is the link's exact counter. The breakdowns and
/// `recent_clicks` cover only the most recent [`RECENT_EVENTS_LIMIT`] events.
#[derive(Debug, Clone)]
pub struct LinkAnalytics {
    pub link_id: i64,
    pub total_clicks: i64,
    pub recent_clicks: Vec<AnalyticsEvent>,
    pub browser_stats: BTreeMap<String, i64>,
    pub device_stats: BTreeMap<String, i64>,
    pub os_stats: BTreeMap<String, i64>,
}

pub struct AnalyticsService<L, A>
where
    L: LinkRepository + ?Sized,
    A: AnalyticsRepository + ?Sized,
{
    links: Arc<L>,
    analytics: Arc<A>,
}

impl<L, A> AnalyticsService<L, A>
where
    L: LinkRepository + ?Sized,
    A: AnalyticsRepository + ?Sized,
{
    pub fn new(links: Arc<L>, analytics: Arc<A>) -> Self {
        Self { links, analytics }
    }

    /// Summarizes an owned link by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist or belongs to
    /// another owner.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn summarize(&self, link_id: i64, owner_id: i64) -> Result<LinkAnalytics, AppError> {
        let link = self
            .links
            .find_owned(link_id, owner_id)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": link_id })))?;

        self.summarize_link(link).await
    }

    /// Summarizes an owned link by its short code or alias.
    ///
    /// Inactive links are included.
    ///
    /// # Errors
    ///
    /// Same as [`Self::summarize`].
    pub async fn summarize_by_token(
        &self,
        token: &str,
        owner_id: i64,
    ) -> Result<LinkAnalytics, AppError> {
        let link = self
            .links
            .find_by_token(token)
            .await?
            .filter(|link| link.owner_id == owner_id)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "token": token })))?;

        self.summarize_link(link).await
    }

    async fn summarize_link(&self, link: Link) -> Result<LinkAnalytics, AppError> {
        let recent_clicks = self
            .analytics
            .recent_for_link(link.id, RECENT_EVENTS_LIMIT)
            .await?;

        let browser_stats = tally(&recent_clicks, |e| e.browser.as_deref());
        let device_stats = tally(&recent_clicks, |e| e.device.as_deref());
        let os_stats = tally(&recent_clicks, |e| e.os.as_deref());

        Ok(LinkAnalytics {
            link_id: link.id,
            total_clicks: link.click_count,
            recent_clicks,
            browser_stats,
            device_stats,
            os_stats,
        })
    }
}

fn tally<F>(events: &[AnalyticsEvent], field: F) -> BTreeMap<String, i64>
where
    F: Fn(&AnalyticsEvent) -> Option<&str>,
{
    let mut counts = BTreeMap::new();
    for event in events {
        let key = field(event).unwrap_or("Unknown");
        *counts.entry(key.to_string()).or_insert(0) += 1;
    }
    counts
}
