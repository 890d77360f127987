//! Header manipulation for both directions of the proxy.
//!
//! # Responsibilities
//! - Strip edge-injected diagnostic headers before forwarding
//! - Strip hop-by-hop headers in both directions
//! - Force permissive CORS on responses
//! - Remove upstream security headers scoped to the upstream hostname
//!
//! # Design Decisions
//! - `HeaderMap` is owned and passed by value; nothing mutates shared state
//! - `insert` replaces every value of a key (last-set wins)

use axum::http::{
    header::{self, HeaderName},
    HeaderMap, HeaderValue,
};

/// Headers a hosting edge adds that reveal the request passed through it.
pub const EDGE_DIAGNOSTIC_HEADERS: &[&str] = &[
    "cf-connecting-ip",
    "cf-ray",
    "cf-ipcountry",
    "cf-visitor",
    "cdn-loop",
    "true-client-ip",
    "x-real-ip",
    "x-forwarded-for",
    "x-forwarded-proto",
    "x-forwarded-host",
    "forwarded",
];

/// Connection-scoped headers that must never be relayed.
const HOP_BY_HOP_HEADERS: &[HeaderName] = &[
    header::CONNECTION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
];

/// Non-standard hop-by-hop headers.
const LEGACY_HOP_BY_HOP: &[&str] = &["keep-alive", "proxy-connection"];

/// Upstream security headers removed from every response.
pub const STRIPPED_RESPONSE_HEADERS: &[HeaderName] = &[
    header::CONTENT_SECURITY_POLICY,
    header::X_FRAME_OPTIONS,
    header::X_CONTENT_TYPE_OPTIONS,
];

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "*";

/// Remove every header listed in `names` (case-insensitive).
pub fn strip_named(headers: &mut HeaderMap, names: &[String]) {
    for name in names {
        if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
            headers.remove(name);
        }
    }
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let nominated: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();

    for name in nominated {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
    for name in LEGACY_HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// Overwrite the CORS headers with the permissive set.
pub fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(CORS_ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
}

/// Remove headers that pin the page to the upstream's own hostname.
pub fn strip_security_headers(headers: &mut HeaderMap) {
    for name in STRIPPED_RESPONSE_HEADERS {
        headers.remove(name);
    }
}

/// Full response-side sanitization applied to every relayed response.
pub fn sanitize_response_headers(mut headers: HeaderMap) -> HeaderMap {
    strip_hop_by_hop(&mut headers);
    apply_cors(&mut headers);
    strip_security_headers(&mut headers);
    headers
}
