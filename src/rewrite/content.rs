//! Content-type classification.

use axum::http::{header, HeaderMap};

/// Media type fragments whose bodies are rewritten.
const TEXTUAL_FAMILIES: &[&str] = &[
    "text/",
    "application/javascript",
    "application/json",
    "application/xml",
    "font/",
];

/// True if `content_type` names a textual family (case-insensitive substring).
pub fn is_textual(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    TEXTUAL_FAMILIES
        .iter()
        .any(|family| content_type.contains(family))
}

/// Classify a response by its `Content-Type` header. Missing or non-UTF-8
/// values count as binary.
pub fn is_textual_response(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(is_textual)
        .unwrap_or(false)
}
