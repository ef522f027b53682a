use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::domain::repositories::UsageCounter;
use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
struct Counter {
    count: i64,
    expires_at: Instant,
}

/// In-memory counters. The read-modify-write runs under the shard lock of
/// the key's entry, so concurrent increments are never lost.
#[derive(Debug, Default)]
pub struct InMemoryUsageCounter {
    counters: DashMap<String, Counter>,
}

impl InMemoryUsageCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageCounter for InMemoryUsageCounter {
    async fn increment(&self, key: &str, ttl_secs: u64) -> Result<i64, AppError> {
        let now = Instant::now();
        let fresh = Counter {
            count: 0,
            expires_at: now + Duration::from_secs(ttl_secs),
        };

        let mut counter = self.counters.entry(key.to_string()).or_insert(fresh);
        if counter.expires_at <= now {
            *counter = fresh;
        }
        counter.count += 1;

        Ok(counter.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn increments_per_key() {
        let counter = InMemoryUsageCounter::new();

        assert_eq!(counter.increment("a", 60).await.unwrap(), 1);
        assert_eq!(counter.increment("a", 60).await.unwrap(), 2);
        assert_eq!(counter.increment("b", 60).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn expired_key_restarts() {
        let counter = InMemoryUsageCounter::new();

        counter.increment("a", 0).await.unwrap();

        assert_eq!(counter.increment("a", 60).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_exact() {
        let counter = Arc::new(InMemoryUsageCounter::new());

        let mut handles = Vec::new();
        for _ in 0..50 {
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                counter.increment("k", 60).await.unwrap()
            }));
        }

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.unwrap());
        }
        values.sort_unstable();

        assert_eq!(values, (1..=50).collect::<Vec<i64>>());
    }
}
