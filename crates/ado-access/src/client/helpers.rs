//! Pure helpers: URL building, Retry-After parsing (no HTTP, no status logic).

use std::time::Duration;

use url::Url;

use crate::error::{AccessError, AccessResult};

/// Join `base` and `path` and append query parameters (percent-encoded).
pub(crate) fn build_url(base: &str, path: &str, params: &[(&str, &str)]) -> AccessResult<String> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined).map_err(|e| AccessError::Config {
        message: format!("invalid URL '{}': {}", joined, e),
    })?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params.iter());
    }
    Ok(url.to_string())
}

/// Percent-encode one path segment.
pub(crate) fn path_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// URL without its query string, for error messages.
pub(crate) fn describe_url(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_string()
}

/// Parse a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
