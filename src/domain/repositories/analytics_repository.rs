//! Repository trait for click analytics.

use crate::domain::entities::{AnalyticsEvent, NewAnalyticsEvent};
use crate::error::AppError;
use async_trait::async_trait;

/// Append-only store of analytics events.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgAnalyticsRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::InMemoryAnalyticsRepository`] - In-memory implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Appends one event.
    ///
    /// An event whose `event_key` is already stored is not written again;
    /// the stored event is returned instead.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn record(&self, event: NewAnalyticsEvent) -> Result<AnalyticsEvent, AppError>;

    /// Returns up to `limit` events of a link, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn recent_for_link(
        &self,
        link_id: i64,
        limit: i64,
    ) -> Result<Vec<AnalyticsEvent>, AppError>;
}
