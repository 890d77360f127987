//! The proxy's own public URL for a request.
//!
//! Rewriting needs the origin and hostname the client used to reach us.
//! Behind a TLS-terminating edge the connection itself is plain HTTP, so the
//! scheme comes from `X-Forwarded-Proto` when present.

use axum::http::{header, HeaderMap, Uri};
use url::Url;

use crate::error::ProxyError;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Public URL of one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyOrigin {
    url: Url,
}

impl ProxyOrigin {
    /// Parse an absolute URL, e.g. `https://proxy.example/a`.
    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        Url::parse(url).map(|url| Self { url })
    }

    /// Reconstruct the request URL from its URI and headers.
    ///
    /// Authority precedence: absolute URI, `Host` header, `fallback_authority`.
    pub fn from_request(
        uri: &Uri,
        headers: &HeaderMap,
        default_scheme: &str,
        fallback_authority: &str,
    ) -> Result<Self, ProxyError> {
        let scheme = headers
            .get(X_FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| v == "http" || v == "https")
            .unwrap_or_else(|| default_scheme.to_string());

        let authority = uri
            .authority()
            .map(|a| a.as_str().to_string())
            .or_else(|| {
                headers
                    .get(header::HOST)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| fallback_authority.to_string());

        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

        let raw = format!("{}://{}{}", scheme, authority, path_and_query);
        Self::parse(&raw)
            .map_err(|e| ProxyError::InvalidRequest(format!("cannot derive request URL '{}': {}", raw, e)))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `scheme://host[:port]`, default ports omitted.
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// Hostname without port.
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }
}
