use async_trait::async_trait;
use dashmap::{DashMap, Entry};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::entities::{AnalyticsEvent, NewAnalyticsEvent};
use crate::domain::repositories::AnalyticsRepository;
use crate::error::AppError;

/// In-memory event log, bucketed by link id.
#[derive(Debug, Default)]
pub struct InMemoryAnalyticsRepository {
    events: DashMap<i64, Vec<AnalyticsEvent>>,
    by_key: DashMap<String, AnalyticsEvent>,
    next_id: AtomicI64,
}

impl InMemoryAnalyticsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events recorded for a link.
    pub fn count_for_link(&self, link_id: i64) -> usize {
        self.events.get(&link_id).map_or(0, |events| events.len())
    }
}

#[async_trait]
impl AnalyticsRepository for InMemoryAnalyticsRepository {
    async fn record(&self, event: NewAnalyticsEvent) -> Result<AnalyticsEvent, AppError> {
        let slot = match self.by_key.entry(event.event_key.clone()) {
            Entry::Occupied(existing) => return Ok(existing.get().clone()),
            Entry::Vacant(slot) => slot,
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let event = event.into_event(id);

        self.events
            .entry(event.link_id)
            .or_default()
            .push(event.clone());
        slot.insert(event.clone());

        Ok(event)
    }

    async fn recent_for_link(
        &self,
        link_id: i64,
        limit: i64,
    ) -> Result<Vec<AnalyticsEvent>, AppError> {
        let mut events = self
            .events
            .get(&link_id)
            .map(|events| events.clone())
            .unwrap_or_default();

        events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(b.id.cmp(&a.id)));
        events.truncate(usize::try_from(limit).unwrap_or(0));

        Ok(events)
    }
}
