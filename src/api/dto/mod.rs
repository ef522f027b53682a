//! Data Transfer Objects for API requests and responses.
//!
//! Bodies are camelCase JSON. Request DTOs derive `validator::Validate` for
//! shape checks; URL and alias rules live in the link service.

pub mod analytics;
pub mod health;
pub mod links;
