//! DTOs for the analytics endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::application::services::LinkAnalytics;
use crate::domain::entities::AnalyticsEvent;

/// One sampled click.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickDto {
    pub id: i64,
    pub short_code: String,
    pub occurred_at: DateTime<Utc>,
    pub user_agent: String,
    pub browser: Option<String>,
    pub device: Option<String>,
    pub os: Option<String>,
    pub ip_address: Option<String>,
    pub referrer: Option<String>,
}

impl From<AnalyticsEvent> for ClickDto {
    fn from(event: AnalyticsEvent) -> Self {
        Self {
            id: event.id,
            short_code: event.short_code,
            occurred_at: event.occurred_at,
            user_agent: event.user_agent,
            browser: event.browser,
            device: event.device,
            os: event.os,
            ip_address: event.ip_address,
            referrer: event.referrer,
        }
    }
}

/// Response of `GET /api/analytics/{token}`.
///
/// `totalClicks` is exact; the breakdowns cover the sampled recent clicks only.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub total_clicks: i64,
    pub recent_clicks: Vec<ClickDto>,
    pub browser_stats: BTreeMap<String, i64>,
    pub device_stats: BTreeMap<String, i64>,
    pub os_stats: BTreeMap<String, i64>,
}

impl From<LinkAnalytics> for AnalyticsResponse {
    fn from(analytics: LinkAnalytics) -> Self {
        Self {
            total_clicks: analytics.total_clicks,
            recent_clicks: analytics
                .recent_clicks
                .into_iter()
                .map(ClickDto::from)
                .collect(),
            browser_stats: analytics.browser_stats,
            device_stats: analytics.device_stats,
            os_stats: analytics.os_stats,
        }
    }
}
