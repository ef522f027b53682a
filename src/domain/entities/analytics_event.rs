//! Analytics event entity representing one recorded visit.

use chrono::{DateTime, Utc};

use crate::utils::code_generator::generate_code;

const EVENT_KEY_LENGTH: usize = 22;

/// Generates a random key identifying one visit across write retries.
pub fn new_event_key() -> String {
    generate_code(EVENT_KEY_LENGTH)
}

/// A click recorded when a short link was resolved.
///
/// Events are append-only and reference their link by id only; they survive
/// deletion of the link.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsEvent {
    pub id: i64,
    pub link_id: i64,
    /// Token the visitor used (short code or alias).
    pub short_code: String,
    pub occurred_at: DateTime<Utc>,
    pub user_agent: String,
    pub browser: Option<String>,
    pub device: Option<String>,
    pub os: Option<String>,
    pub ip_address: Option<String>,
    pub referrer: Option<String>,
}

/// Input data for recording a new analytics event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalyticsEvent {
    /// Stores keep at most one event per key, so a retried write is a no-op.
    pub event_key: String,
    pub link_id: i64,
    pub short_code: String,
    pub occurred_at: DateTime<Utc>,
    pub user_agent: String,
    pub browser: Option<String>,
    pub device: Option<String>,
    pub os: Option<String>,
    pub ip_address: Option<String>,
    pub referrer: Option<String>,
}

impl NewAnalyticsEvent {
    /// Materializes the event with a store-assigned id.
    pub fn into_event(self, id: i64) -> AnalyticsEvent {
        AnalyticsEvent {
            id,
            link_id: self.link_id,
            short_code: self.short_code,
            occurred_at: self.occurred_at,
            user_agent: self.user_agent,
            browser: self.browser,
            device: self.device,
            os: self.os,
            ip_address: self.ip_address,
            referrer: self.referrer,
        }
    }
}
