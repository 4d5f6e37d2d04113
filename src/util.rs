//! Shared utility functions for the netprov application.

use axum::http::HeaderMap;
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use unicode_normalization::UnicodeNormalization;

use crate::config::Config;

/// Generate a random alphanumeric key of exactly `length` characters,
/// drawn uniformly from `[A-Za-z0-9]`.
///
/// Collision-resistant in practice, but not a secrecy mechanism: payload
/// confidentiality is the token codec's job, not this function's.
pub fn generate_key(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Hotspot access mode, derived from whether the login URL is secured.
pub fn access_mode(url: &str) -> &'static str {
    if url.starts_with("https://") { "https" } else { "http" }
}

/// Normalize a user-supplied device name into an identity-safe slug.
///
/// NFKC-normalizes, then maps every non-alphanumeric run to a single `-`.
/// Case is preserved so operator-chosen names stay recognizable.
pub fn slug(name: &str) -> String {
    let normalized: String = name.trim().nfkc().collect();
    let mut out = String::with_capacity(normalized.len());
    let mut last_dash = true;
    for c in normalized.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Resolve the externally-reachable base URL for device-facing links.
///
/// A public domain in the `Host` header is used as-is; anything else
/// (localhost, bare IPs, NATed dev boxes) falls back to the configured
/// public IP and port, which is what a router in the field can reach.
pub fn external_base_url(headers: &HeaderMap, config: &Config) -> String {
    let host = headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let is_public_domain = [".com", ".org", ".net", ".io"]
        .iter()
        .any(|tld| host.contains(tld));

    if is_public_domain {
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("https");
        format!("{scheme}://{host}")
    } else {
        format!("http://{}:{}", config.public_ip, config.port)
    }
}
