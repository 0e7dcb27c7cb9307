//! Origin/domain derivation, the partition key for per-site state.

use url::Url;

/// Placeholder domain for URLs that cannot be parsed.
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// Host component of `url`, or [`UNKNOWN_DOMAIN`].
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| UNKNOWN_DOMAIN.to_string())
}
