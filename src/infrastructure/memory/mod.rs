//! In-memory repository implementations backed by `DashMap`.
//!
//! They honour the same contracts as the PostgreSQL repositories (single
//! token namespace, atomic counters) and back the HTTP tests, which then need
//! no database.

mod analytics_repository;
mod link_repository;
mod token_repository;
mod usage_counter;

pub use analytics_repository::InMemoryAnalyticsRepository;
pub use link_repository::InMemoryLinkRepository;
pub use token_repository::InMemoryTokenRepository;
pub use usage_counter::InMemoryUsageCounter;
