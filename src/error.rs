//! Error types for the image editing pipeline.

use std::time::Duration;

/// Errors that can occur while loading an image or running an edit.
#[derive(Debug, thiserror::Error)]
pub enum RetouchError {
    /// The selected file is not a recognized image.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The model responded without producing an image.
    #[error("no image was returned by the model: {0}")]
    EmptyResult(String),

    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., reading the input file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for editing operations.
pub type Result<T> = std::result::Result<T, RetouchError>;

/// Cleans an API error body for display: strips HTML error pages down to a
/// short marker and truncates very long messages.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with('<') {
        return "upstream returned an HTML error page".into();
    }
    const MAX: usize = 500;
    if trimmed.len() > MAX {
        let mut end = MAX;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    } else {
        trimmed.to_string()
    }
}

/// Parses a `Retry-After` header value, seconds form only.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}
