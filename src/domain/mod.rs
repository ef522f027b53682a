//! Domain layer containing business entities and data access contracts.
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`click_event`] - A resolved visit waiting to be recorded
//! - [`click_worker`] - Queue and background worker that record visits
//!
//! # Click Processing Flow
//!
//! 1. The redirect service resolves a token to an active link
//! 2. A [`click_event::ClickEvent`] is dispatched to the [`click_worker::ClickQueue`]
//! 3. [`click_worker::run_click_worker`] records it with retry logic
//! 4. The analytics event and the counter increment are written independently

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod repositories;
