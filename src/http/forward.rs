//! Upstream forwarding.
//!
//! One attempt per request, redirects are never followed, and the response
//! body stays a stream until a later stage decides whether to buffer it.

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use futures_util::{StreamExt, TryStreamExt};

use crate::config::TimeoutConfig;
use crate::error::ProxyError;
use crate::http::request::OutboundRequest;
use crate::resilience::timeouts::with_deadline;
use crate::rewrite::{BodyStream, BoxError};

/// A response as received from the upstream.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BodyStream,
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Sends outbound requests to the upstream.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    deadline: Duration,
}

impl Forwarder {
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .no_proxy()
            .build()
            .map_err(|e| ProxyError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            deadline: Duration::from_secs(timeouts.upstream_secs),
        })
    }

    /// Send `request` and wait for the response head.
    pub async fn forward(&self, request: OutboundRequest<Body>) -> Result<UpstreamResponse, ProxyError> {
        let OutboundRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let mut response = with_deadline(self.deadline, async {
            builder.send().await.map_err(ProxyError::UpstreamUnreachable)
        })
        .await?;

        let status = response.status();
        let headers = std::mem::take(response.headers_mut());
        let body = response
            .bytes_stream()
            .map_err(|e| Box::new(e) as BoxError)
            .boxed();

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}
