//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access. Concrete implementations live in
//! `crate::infrastructure`; mocks are generated via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Links and the token namespace
//! - [`AnalyticsRepository`] - Append-only click events
//! - [`TokenRepository`] - API token authentication
//! - [`UserRepository`] - Link owners
//! - [`UsageCounter`] - Rate limiter counters

pub mod analytics_repository;
pub mod link_repository;
pub mod token_repository;
pub mod usage_counter;
pub mod user_repository;

pub use analytics_repository::AnalyticsRepository;
pub use link_repository::LinkRepository;
pub use token_repository::{ApiToken, TokenRepository};
pub use usage_counter::UsageCounter;
pub use user_repository::UserRepository;

#[cfg(test)]
pub use analytics_repository::MockAnalyticsRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
#[cfg(test)]
pub use usage_counter::MockUsageCounter;
#[cfg(test)]
pub use user_repository::MockUserRepository;
