//! Server-rendered HTML shown to link visitors.
//!
//! Uses Askama templates from `templates/`.
//!
//! # Modules
//!
//! - [`pages`] - Not-found and error pages for the redirect route

pub mod pages;
