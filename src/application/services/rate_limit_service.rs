//! Per-owner daily ceiling on link creation.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveTime, Utc};
use tracing::warn;

use crate::domain::repositories::UsageCounter;
use crate::error::AppError;

/// Extra lifetime of a counter key past the end of its day.
const KEY_GRACE_SECS: u64 = 60;

/// Counts link creations per owner per UTC day.
///
/// Every attempt counts, including ones later rejected by validation.
pub struct RateLimitService<C: UsageCounter + ?Sized> {
    counter: Arc<C>,
    limit_per_day: u32,
}

impl<C: UsageCounter + ?Sized> RateLimitService<C> {
    pub fn new(counter: Arc<C>, limit_per_day: u32) -> Self {
        Self {
            counter,
            limit_per_day,
        }
    }

    /// Counts one creation attempt for `owner_id` today.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::RateLimited`] once the owner exceeds the daily
    /// limit, with the seconds until the next UTC midnight as retry hint.
    /// Returns [`AppError::Internal`] if the counter store fails.
    pub async fn check(&self, owner_id: i64) -> Result<(), AppError> {
        self.check_at(owner_id, Utc::now()).await
    }

    async fn check_at(&self, owner_id: i64, now: DateTime<Utc>) -> Result<(), AppError> {
        let key = rate_limit_key(owner_id, now);
        let remaining = seconds_until_midnight(now);

        let count = self
            .counter
            .increment(&key, remaining + KEY_GRACE_SECS)
            .await?;

        if count > i64::from(self.limit_per_day) {
            warn!(owner_id, count, "Daily link creation limit reached");
            return Err(AppError::rate_limited(
                "Rate limit exceeded. Maximum links per day reached.",
                remaining,
            ));
        }

        Ok(())
    }
}

/// Counter key for an owner's creations on the UTC day of `now`.
pub fn rate_limit_key(owner_id: i64, now: DateTime<Utc>) -> String {
    format!("ratelimit:{}:{}", owner_id, now.format("%Y-%m-%d"))
}

fn seconds_until_midnight(now: DateTime<Utc>) -> u64 {
    let next_midnight = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .map(|day| day.and_time(NaiveTime::MIN).and_utc());

    match next_midnight {
        Some(midnight) => (midnight - now).num_seconds().max(1) as u64,
        None => 1,
    }
}
