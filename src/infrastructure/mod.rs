//! Infrastructure layer for external integrations.
//!
//! # Modules
//!
//! - [`cache`] - Redirect cache (Redis and no-op implementations)
//! - [`counter`] - Redis usage counter for the rate limiter
//! - [`memory`] - In-memory repositories
//! - [`persistence`] - PostgreSQL repository implementations

pub mod cache;
pub mod counter;
pub mod memory;
pub mod persistence;
