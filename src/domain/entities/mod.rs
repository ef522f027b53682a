//! Core domain entities.
//!
//! Entities are plain data structures. Each has a separate input struct used
//! for creation (`NewLink`, `NewAnalyticsEvent`, `NewUser`) and links have a
//! [`LinkPatch`] for partial updates.
//!
//! - [`Link`] - A short link owned by a user
//! - [`AnalyticsEvent`] - One recorded visit of a link
//! - [`User`] - An owner, supplied by the external identity provider

pub mod analytics_event;
pub mod link;
pub mod user;

pub use analytics_event::{AnalyticsEvent, NewAnalyticsEvent, new_event_key};
pub use link::{Link, LinkPatch, NewLink};
pub use user::{NewUser, User};
