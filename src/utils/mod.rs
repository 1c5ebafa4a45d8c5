//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Whether a string is an absolute http(s) URL.
pub fn is_http_url(raw: &str) -> bool {
    match Url::parse(raw.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Whether the URL's host is exactly the given host.
pub fn host_matches(raw: &str, host: &str) -> bool {
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.eq_ignore_ascii_case(host)))
        .unwrap_or(false)
}

/// Conventional streaming-path markers seen in directory leaf URLs.
const STREAM_MARKERS: [&str; 3] = ["tune.ashx", "stream", "radio"];

/// Whether a URL looks like a playable stream endpoint.
pub fn has_stream_marker(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    STREAM_MARKERS.iter().any(|m| lower.contains(m))
}
