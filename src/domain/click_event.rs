//! Click event model for asynchronous click tracking.

use chrono::{DateTime, Utc};

use crate::domain::entities::{NewAnalyticsEvent, new_event_key};
use crate::utils::user_agent::classify;

/// User agent recorded when the visitor sent none.
pub const UNKNOWN_USER_AGENT: &str = "Unknown";

/// A resolved visit waiting to be recorded.
///
/// Built by the redirect path from the request context and handed to the
/// click queue, so the redirect never waits for the analytics writes.
/// Client metadata is optional to handle missing headers.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    /// Idempotency key for the analytics write.
    pub event_key: String,
    pub link_id: i64,
    /// Token the visitor used (short code or alias).
    pub token: String,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub ip: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl ClickEvent {
    /// Creates a click event stamped with the current time.
    pub fn new(
        link_id: i64,
        token: String,
        ip: Option<String>,
        user_agent: Option<&str>,
        referrer: Option<&str>,
    ) -> Self {
        Self {
            event_key: new_event_key(),
            link_id,
            token,
            ip,
            user_agent: user_agent.map(|s| s.to_string()),
            referrer: referrer.map(|s| s.to_string()),
            occurred_at: Utc::now(),
        }
    }

    /// Converts the event into an analytics record.
    ///
    /// User-agent classification happens here, off the request path.
    pub fn into_new_event(self) -> NewAnalyticsEvent {
        let user_agent = self
            .user_agent
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_USER_AGENT.to_string());
        let client = classify(&user_agent);

        NewAnalyticsEvent {
            event_key: self.event_key,
            link_id: self.link_id,
            short_code: self.token,
            occurred_at: self.occurred_at,
            browser: Some(client.browser.to_string()),
            device: Some(client.device.to_string()),
            os: Some(client.os.to_string()),
            user_agent,
            ip_address: self.ip,
            referrer: self.referrer,
        }
    }
}
