//! Application layer services implementing business logic.
//!
//! Services consume repository traits and provide a clean API for HTTP
//! handlers.
//!
//! # Available Services
//!
//! - [`services::LinkService`] - Owner-scoped link management
//! - [`services::RedirectService`] - Token resolution and click dispatch
//! - [`services::AnalyticsService`] - Per-link click summaries
//! - [`services::AuthService`] - API token authentication
//! - [`services::RateLimitService`] - Daily link creation ceiling

pub mod services;
