//! Shared utility functions used across multiple modules.

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

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Append the encrypted auth token as a query parameter so the attachment host
/// can authorize a plain GET.
///
/// Returns the URL unchanged when no token is available.
pub fn add_encrypted_auth_token_to_url(url: &str, token: Option<&str>) -> String {
    let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) else {
        return url.to_string();
    };
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{url}{separator}encryptedAuthToken={}",
        urlencoding::encode(token)
    )
}

/// Current Unix timestamp in milliseconds.
pub fn unix_timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
