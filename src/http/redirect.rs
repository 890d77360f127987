//! Redirect `Location` rewriting.
//!
//! Redirects that stay on the upstream are re-aimed at the proxy so the
//! client keeps talking to us; redirects elsewhere are passed through.

use std::borrow::Cow;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use url::Url;

use crate::error::ProxyError;
use crate::http::origin::ProxyOrigin;
use crate::http::response::{ProxyBody, ProxyResponse};
use crate::security::headers::apply_cors;

/// Statuses whose `Location` the proxy takes over.
pub fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// How to answer a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// Points at the upstream; rewritten onto the proxy origin.
    Internal(String),
    /// Points elsewhere; sent verbatim.
    External(String),
    /// Could not be resolved but looked like an absolute path.
    RawPath(String),
    /// Nothing to rewrite; handled as an ordinary response.
    PassThrough,
}

/// Rewrites redirect responses for one upstream origin.
#[derive(Debug, Clone)]
pub struct RedirectRewriter {
    upstream_origin: Url,
    upstream_hostname: String,
}

impl RedirectRewriter {
    pub fn new(upstream_origin: &str, upstream_hostname: &str) -> Result<Self, ProxyError> {
        let upstream_origin = Url::parse(upstream_origin)
            .map_err(|e| ProxyError::Configuration(format!("upstream origin '{}': {}", upstream_origin, e)))?;
        Ok(Self {
            upstream_origin,
            upstream_hostname: upstream_hostname.to_ascii_lowercase(),
        })
    }

    /// Decide where a redirect from the upstream should send the client.
    pub fn target(&self, status: StatusCode, headers: &HeaderMap, proxy: &ProxyOrigin) -> RedirectTarget {
        if !is_redirect(status) {
            return RedirectTarget::PassThrough;
        }
        let Some(location) = headers.get(header::LOCATION).map(decode_location) else {
            return RedirectTarget::PassThrough;
        };

        match self.upstream_origin.join(&location) {
            Ok(resolved) => {
                let internal = resolved
                    .host_str()
                    .map(|h| h.eq_ignore_ascii_case(&self.upstream_hostname))
                    .unwrap_or(false);
                if internal {
                    let mut target = format!("{}{}", proxy.origin(), resolved.path());
                    if let Some(query) = resolved.query().filter(|q| !q.is_empty()) {
                        target.push('?');
                        target.push_str(query);
                    }
                    RedirectTarget::Internal(target)
                } else {
                    RedirectTarget::External(location.to_string())
                }
            }
            Err(source) => {
                let error = ProxyError::RedirectLocationUnparseable {
                    location: location.to_string(),
                    source,
                };
                if location.starts_with('/') {
                    tracing::debug!(error = %error, "Treating Location as a raw path");
                    RedirectTarget::RawPath(format!("{}{}", proxy.origin(), location))
                } else {
                    tracing::debug!(error = %error, "Passing redirect through");
                    RedirectTarget::PassThrough
                }
            }
        }
    }

    /// Build the short-circuit redirect, or `None` when the response should
    /// go through the ordinary response path.
    pub fn rewrite(&self, status: StatusCode, headers: &HeaderMap, proxy: &ProxyOrigin) -> Option<ProxyResponse> {
        // External and raw-path targets reuse the upstream's bytes as sent.
        let location = match self.target(status, headers, proxy) {
            RedirectTarget::Internal(l) => HeaderValue::from_str(&l).ok()?,
            RedirectTarget::External(_) => headers.get(header::LOCATION)?.clone(),
            RedirectTarget::RawPath(_) => {
                let raw = headers.get(header::LOCATION)?.as_bytes();
                HeaderValue::from_bytes(&[proxy.origin().as_bytes(), raw].concat()).ok()?
            }
            RedirectTarget::PassThrough => return None,
        };

        let mut headers = HeaderMap::new();
        headers.insert(header::LOCATION, location);
        apply_cors(&mut headers);

        Some(ProxyResponse {
            status,
            headers,
            body: ProxyBody::Empty,
        })
    }
}

/// Header bytes outside visible ASCII are read as Latin-1, so an opaque
/// `Location` still resolves instead of being treated as missing.
fn decode_location(value: &HeaderValue) -> Cow<'_, str> {
    match value.to_str() {
        Ok(location) => Cow::Borrowed(location),
        Err(_) => Cow::Owned(value.as_bytes().iter().map(|&b| char::from(b)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter() -> RedirectRewriter {
        RedirectRewriter::new("https://anyrouter.top", "anyrouter.top").unwrap()
    }

    fn proxy() -> ProxyOrigin {
        ProxyOrigin::parse("https://proxy.example/a").unwrap()
    }

    fn location(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::LOCATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_redirect_statuses() {
        for code in [301, 302, 303, 307, 308] {
            assert!(is_redirect(StatusCode::from_u16(code).unwrap()));
        }
        for code in [200, 300, 304, 404] {
            assert!(!is_redirect(StatusCode::from_u16(code).unwrap()));
        }
    }

    #[test]
    fn test_internal_absolute() {
        let target = rewriter().target(StatusCode::FOUND, &location("https://anyrouter.top/x?y=1"), &proxy());
        assert_eq!(target, RedirectTarget::Internal("https://proxy.example/x?y=1".into()));
    }

    #[test]
    fn test_internal_host_case_insensitive() {
        let target = rewriter().target(StatusCode::FOUND, &location("https://AnyRouter.Top/x#frag"), &proxy());
        assert_eq!(target, RedirectTarget::Internal("https://proxy.example/x".into()));
    }

    #[test]
    fn test_external_absolute() {
        let target = rewriter().target(StatusCode::FOUND, &location("https://external.example/z"), &proxy());
        assert_eq!(target, RedirectTarget::External("https://external.example/z".into()));
    }

    #[test]
    fn test_relative() {
        let target = rewriter().target(
            StatusCode::TEMPORARY_REDIRECT,
            &location("/relative/path"),
            &proxy(),
        );
        assert_eq!(target, RedirectTarget::Internal("https://proxy.example/relative/path".into()));
    }

    #[test]
    fn test_protocol_relative_external() {
        let target = rewriter().target(StatusCode::FOUND, &location("//cdn.example/asset"), &proxy());
        assert_eq!(target, RedirectTarget::External("//cdn.example/asset".into()));
    }

    #[test]
    fn test_unresolvable_raw_path() {
        // `//` followed by an invalid host fails to resolve but starts with `/`.
        let target = rewriter().target(StatusCode::FOUND, &location("//bad host/x"), &proxy());
        assert_eq!(target, RedirectTarget::RawPath("https://proxy.example//bad host/x".into()));
    }

    #[test]
    fn test_unresolvable_non_path_passes_through() {
        let target = rewriter().target(StatusCode::FOUND, &location("http://[::1"), &proxy());
        assert_eq!(target, RedirectTarget::PassThrough);
    }

    #[test]
    fn test_non_ascii_internal_location_rewritten() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::LOCATION,
            HeaderValue::from_bytes(b"https://anyrouter.top/caf\xe9").unwrap(),
        );

        let target = rewriter().target(StatusCode::FOUND, &headers, &proxy());
        assert_eq!(target, RedirectTarget::Internal("https://proxy.example/caf%C3%A9".into()));

        let response = rewriter().rewrite(StatusCode::FOUND, &headers, &proxy()).unwrap();
        assert_eq!(response.headers[header::LOCATION], "https://proxy.example/caf%C3%A9");
    }

    #[test]
    fn test_non_ascii_external_location_kept_byte_for_byte() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::LOCATION,
            HeaderValue::from_bytes(b"https://external.example/na\xefve").unwrap(),
        );

        let response = rewriter().rewrite(StatusCode::FOUND, &headers, &proxy()).unwrap();
        assert_eq!(response.headers[header::LOCATION].as_bytes(), b"https://external.example/na\xefve");
    }

    #[test]
    fn test_missing_location_passes_through() {
        let target = rewriter().target(StatusCode::MOVED_PERMANENTLY, &HeaderMap::new(), &proxy());
        assert_eq!(target, RedirectTarget::PassThrough);
        assert!(rewriter()
            .rewrite(StatusCode::MOVED_PERMANENTLY, &HeaderMap::new(), &proxy())
            .is_none());
    }

    #[test]
    fn test_rewrite_builds_bare_redirect() {
        let mut upstream = location("https://anyrouter.top/x?y=1");
        upstream.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));

        let response = rewriter()
            .rewrite(StatusCode::FOUND, &upstream, &proxy())
            .unwrap();

        assert_eq!(response.status, StatusCode::FOUND);
        assert_eq!(response.headers[header::LOCATION], "https://proxy.example/x?y=1");
        assert_eq!(response.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(response.headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, PUT, DELETE, OPTIONS");
        assert_eq!(response.headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
        assert!(response.headers.get(header::CONTENT_TYPE).is_none());
        assert!(matches!(response.body, ProxyBody::Empty));
    }
}
