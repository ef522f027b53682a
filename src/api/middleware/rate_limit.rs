//! Per-IP request throttling using the token bucket algorithm.
//!
//! This guards the service itself. The per-owner daily quota on link
//! creation is a separate concern handled by
//! [`crate::application::services::RateLimitService`].
//!
//! Each limiter comes in two flavors: keyed by the socket peer address, or
//! keyed by `X-Forwarded-For` / `X-Real-IP` for deployments behind a trusted
//! reverse proxy.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor},
};

type Layer<K> = GovernorLayer<K, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

const PUBLIC_PER_SECOND: u64 = 2;
const PUBLIC_BURST: u32 = 100;
const API_PER_SECOND: u64 = 1;
const API_BURST: u32 = 10;

/// Rate limiter for the public redirect route.
///
/// # Limits
///
/// - **Rate**: 2 requests per second
/// - **Burst**: 100 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
pub fn layer() -> Layer<PeerIpKeyExtractor> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(PUBLIC_PER_SECOND)
            .burst_size(PUBLIC_BURST)
            .finish()
            .expect("non-zero public rate limit"),
    );

    GovernorLayer::new(governor_conf)
}

/// Same limits as [`layer`], keyed by the forwarded client IP.
pub fn proxied_layer() -> Layer<SmartIpKeyExtractor> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_second(PUBLIC_PER_SECOND)
            .burst_size(PUBLIC_BURST)
            .finish()
            .expect("non-zero public rate limit"),
    );

    GovernorLayer::new(governor_conf)
}

/// Stricter rate limiter for the authenticated API.
///
/// # Limits
///
/// - **Rate**: 1 request per second
/// - **Burst**: 10 requests
///
/// # Example
///
/// ```rust,ignore
/// let api = Router::new()
///     .route("/links", post(create_link_handler))
///     .layer(rate_limit::secure_layer());
/// ```
pub fn secure_layer() -> Layer<PeerIpKeyExtractor> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(API_PER_SECOND)
            .burst_size(API_BURST)
            .finish()
            .expect("non-zero API rate limit"),
    );

    GovernorLayer::new(governor_conf)
}

/// Same limits as [`secure_layer`], keyed by the forwarded client IP.
pub fn secure_proxied_layer() -> Layer<SmartIpKeyExtractor> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_second(API_PER_SECOND)
            .burst_size(API_BURST)
            .finish()
            .expect("non-zero API rate limit"),
    );

    GovernorLayer::new(governor_conf)
}
