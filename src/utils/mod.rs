//! Pure helpers used across the application.
//!
//! - [`code_generator`] - Random short code generation
//! - [`validation`] - URL and alias syntax checks
//! - [`user_agent`] - Heuristic browser/device/OS classification
//! - [`client_ip`] - Visitor IP extraction (proxy-aware)

pub mod client_ip;
pub mod code_generator;
pub mod user_agent;
pub mod validation;
