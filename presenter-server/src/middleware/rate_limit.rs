//! Per-IP rate limiting of `/auth/*` (spec §4.4: "20 requests per
//! 15-minute window per client IP... clients behind a trusted tunnel use
//! the real-IP header for keying"). Grounded on the `tower_governor` usage
//! in `other_examples/manifests/sblanchard-SerialAgent`; replaces the
//! teacher's Redis-backed distributed limiter, which this service has no
//! Redis to back (spec.md Non-goals rule out a persistent database).

use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::GovernorLayer;

const WINDOW_SECS: u64 = 15 * 60;
const LIMIT: u64 = 20;

/// A token bucket that refills one token every `WINDOW_SECS / LIMIT`
/// seconds, capped at a burst of `LIMIT` — the closest token-bucket
/// approximation of "20 requests per 15-minute sliding window" `tower_governor`'s
/// model supports. `SmartIpKeyExtractor` keys on `X-Forwarded-For`/`Forwarded`
/// when present (the trusted-tunnel real-IP case) and falls back to the
/// peer address otherwise.
pub fn auth_rate_limit_layer() -> GovernorLayer<SmartIpKeyExtractor, tower_governor::governor::middleware::NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_second(WINDOW_SECS / LIMIT)
        .burst_size(LIMIT as u32)
        .finish()
        .expect("static governor config is valid");

    GovernorLayer { config: Box::leak(Box::new(config)) }
}
