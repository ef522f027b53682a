//! HTTP middleware for request processing and protection.
//!
//! Provides Bearer authentication, per-IP throttling and request tracing.

pub mod auth;
pub mod rate_limit;
pub mod tracing;
