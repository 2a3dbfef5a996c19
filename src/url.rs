// URL normalization for link targets
// Decides whether typed text is already a usable href or needs a scheme

use regex::Regex;
use std::sync::LazyLock;

/// Scheme prepended to input that is neither absolute nor root-relative
pub const DEFAULT_SCHEME: &str = "https://";

// scheme "://" followed by at least one host character
static ABSOLUTE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z][a-z0-9+.\-]*://[^\s/]").unwrap());

static HTTP_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^https?://").unwrap());

/// Check whether `text` starts with an absolute URL (`scheme://host...`)
pub fn is_url(text: &str) -> bool {
    ABSOLUTE_URL.is_match(text)
}

/// Check whether `text` starts with `http://` or `https://`, ignoring case
pub fn looks_like_http_url(text: &str) -> bool {
    HTTP_URL.is_match(text)
}

/// Turn raw input into an href.
///
/// The input is trimmed. Absolute URLs and root-relative paths are returned
/// as they are, anything else gets [`DEFAULT_SCHEME`] in front of it. Empty
/// input yields an empty string, callers are expected to check for that
/// before committing.
pub fn normalize_href(input: &str) -> String {
    let href = input.trim();
    if href.is_empty() {
        return String::new();
    }

    if is_url(href) || href.starts_with('/') {
        href.to_string()
    } else {
        format!("{DEFAULT_SCHEME}{href}")
    }
}
