//! Outbound request construction.
//!
//! # Responsibilities
//! - Point the request at the fixed upstream (path and query kept as-is)
//! - Present the upstream's own virtual host in `Host`
//! - Drop edge diagnostics and hop-by-hop headers
//! - Re-aim `Origin`/`Referer` that point back at the proxy
//! - Drop bodies on GET/HEAD
//!
//! # Design Decisions
//! - Pure transformation: `InboundRequest` in, `OutboundRequest` out
//! - Unparseable `Origin`/`Referer` are forwarded untouched

use axum::http::{
    header::{self, HeaderName},
    HeaderMap, HeaderValue, Method, Uri,
};
use url::Url;

use crate::config::{schema::SecurityConfig, UpstreamConfig};
use crate::error::ProxyError;
use crate::http::origin::ProxyOrigin;
use crate::security::headers::{strip_hop_by_hop, strip_named};

/// A request as received by the proxy.
#[derive(Debug)]
pub struct InboundRequest<B> {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: B,
    /// Public URL the client used to reach the proxy.
    pub origin: ProxyOrigin,
}

/// A request ready to be sent upstream.
#[derive(Debug)]
pub struct OutboundRequest<B> {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<B>,
}

/// Builds upstream requests for one configured origin.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    upstream_origin: String,
    host_header: HeaderValue,
    strip_headers: Vec<String>,
}

impl RequestBuilder {
    pub fn new(upstream: &UpstreamConfig, security: &SecurityConfig) -> Result<Self, ProxyError> {
        let host_header = HeaderValue::from_str(&upstream.host)
            .map_err(|e| ProxyError::Configuration(format!("upstream host '{}': {}", upstream.host, e)))?;

        Ok(Self {
            upstream_origin: upstream.origin(),
            host_header,
            strip_headers: security.strip_request_headers.clone(),
        })
    }

    pub fn build<B>(&self, inbound: InboundRequest<B>) -> Result<OutboundRequest<B>, ProxyError> {
        let InboundRequest {
            method,
            uri,
            mut headers,
            body,
            origin,
        } = inbound;

        let url = self.target_url(&uri)?;

        strip_hop_by_hop(&mut headers);
        strip_named(&mut headers, &self.strip_headers);
        // Let the outbound client negotiate compression so text bodies
        // arrive decoded.
        headers.remove(header::ACCEPT_ENCODING);
        headers.insert(header::HOST, self.host_header.clone());

        self.rewrite_origin(&mut headers, origin.hostname());
        self.rewrite_referer(&mut headers, origin.hostname());

        let body = if method == Method::GET || method == Method::HEAD {
            headers.remove(header::CONTENT_LENGTH);
            None
        } else {
            Some(body)
        };

        Ok(OutboundRequest {
            method,
            url,
            headers,
            body,
        })
    }

    fn target_url(&self, uri: &Uri) -> Result<Url, ProxyError> {
        let mut target = format!("{}{}", self.upstream_origin, uri.path());
        if let Some(query) = uri.query().filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(query);
        }
        Url::parse(&target)
            .map_err(|e| ProxyError::InvalidRequest(format!("cannot build upstream URL '{}': {}", target, e)))
    }

    fn rewrite_origin(&self, headers: &mut HeaderMap, proxy_hostname: &str) {
        match parse_header_url(headers, header::ORIGIN, "Origin") {
            Some(Ok(url)) if same_host(&url, proxy_hostname) => {
                if let Ok(value) = HeaderValue::from_str(&self.upstream_origin) {
                    headers.insert(header::ORIGIN, value);
                }
            }
            Some(Err(e)) => tracing::debug!(error = %e, "Leaving Origin untouched"),
            _ => {}
        }
    }

    fn rewrite_referer(&self, headers: &mut HeaderMap, proxy_hostname: &str) {
        match parse_header_url(headers, header::REFERER, "Referer") {
            Some(Ok(url)) if same_host(&url, proxy_hostname) => {
                let mut referer = format!("{}{}", self.upstream_origin, url.path());
                if let Some(query) = url.query().filter(|q| !q.is_empty()) {
                    referer.push('?');
                    referer.push_str(query);
                }
                if let Ok(value) = HeaderValue::from_str(&referer) {
                    headers.insert(header::REFERER, value);
                }
            }
            Some(Err(e)) => tracing::debug!(error = %e, "Leaving Referer untouched"),
            _ => {}
        }
    }
}

/// `None` if the header is absent or not UTF-8.
fn parse_header_url(
    headers: &HeaderMap,
    name: HeaderName,
    label: &'static str,
) -> Option<Result<Url, ProxyError>> {
    let value = headers.get(name)?.to_str().ok()?;
    Some(Url::parse(value).map_err(|source| ProxyError::InvalidHeaderValue {
        header: label,
        source,
    }))
}

fn same_host(url: &Url, proxy_hostname: &str) -> bool {
    url.host_str()
        .map(|h| h.eq_ignore_ascii_case(proxy_hostname))
        .unwrap_or(false)
}
