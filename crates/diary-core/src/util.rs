//! Shared utility functions used across multiple modules.

use crate::{Error, Result};

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Trim and cap a response body before it ends up in an error message.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Trim a URL, drop trailing slashes, and require an http(s) scheme.
pub fn normalize_http_url(raw: &str, field: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config(format!("{field} must not be empty")));
    }
    if !is_http_url(trimmed) {
        return Err(Error::Config(format!(
            "{field} must include http:// or https://"
        )));
    }
    Ok(trimmed.to_string())
}
