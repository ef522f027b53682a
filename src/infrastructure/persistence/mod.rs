//! PostgreSQL repository implementations.
//!
//! Queries are built with SQLx at runtime and mapped through `FromRow` structs.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Links and the `link_tokens` namespace
//! - [`PgAnalyticsRepository`] - Click event log
//! - [`PgTokenRepository`] - API token storage and validation
//! - [`PgUserRepository`] - Link owners
//! - [`PgUsageCounter`] - Rate limiter counters

pub mod pg_analytics_repository;
pub mod pg_link_repository;
pub mod pg_token_repository;
pub mod pg_usage_counter;
pub mod pg_user_repository;

pub use pg_analytics_repository::PgAnalyticsRepository;
pub use pg_link_repository::PgLinkRepository;
pub use pg_token_repository::PgTokenRepository;
pub use pg_usage_counter::PgUsageCounter;
pub use pg_user_repository::PgUserRepository;
