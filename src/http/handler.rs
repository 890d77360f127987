//! The proxy pipeline for one request.
//!
//! ```text
//! inbound → RequestBuilder → Forwarder → RedirectRewriter ─┬→ redirect
//!                                                          └→ ResponseRewriter → response
//! ```

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::forward::Forwarder;
use crate::http::origin::ProxyOrigin;
use crate::http::redirect::RedirectRewriter;
use crate::http::request::{InboundRequest, RequestBuilder};
use crate::http::request_id::strip_generated_request_id;
use crate::http::response::ResponseRewriter;
use crate::rewrite::{RewriteOutcome, TextRewriter};

/// How a request left the pipeline.
#[derive(Debug)]
pub enum Handled {
    Redirect,
    Response(RewriteOutcome),
}

impl Handled {
    pub fn label(&self) -> &'static str {
        match self {
            Handled::Redirect => "redirect",
            Handled::Response(outcome) => outcome.label(),
        }
    }
}

/// Stateless request pipeline; shared read-only between requests.
#[derive(Debug, Clone)]
pub struct ProxyHandler {
    requests: RequestBuilder,
    forwarder: Forwarder,
    redirects: RedirectRewriter,
    responses: ResponseRewriter,
    public_scheme: String,
    fallback_authority: String,
}

impl ProxyHandler {
    pub fn new(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let upstream_hostname = config.upstream.hostname();
        let text = TextRewriter::new(&config.upstream.host)
            .map_err(|e| ProxyError::Configuration(e.to_string()))?;

        Ok(Self {
            requests: RequestBuilder::new(&config.upstream, &config.security)?,
            forwarder: Forwarder::new(&config.timeouts)?,
            redirects: RedirectRewriter::new(&config.upstream.origin(), &upstream_hostname)?,
            responses: ResponseRewriter::new(text, config.limits.max_text_body_bytes),
            public_scheme: config.listener.public_scheme.clone(),
            fallback_authority: config.listener.bind_address.clone(),
        })
    }

    pub async fn handle(&self, request: Request<Body>) -> Result<(Response, Handled), ProxyError> {
        let (mut parts, body) = request.into_parts();
        strip_generated_request_id(&mut parts.headers, &parts.extensions);
        let origin = ProxyOrigin::from_request(
            &parts.uri,
            &parts.headers,
            &self.public_scheme,
            &self.fallback_authority,
        )?;

        let outbound = self.requests.build(InboundRequest {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            origin: origin.clone(),
        })?;

        tracing::debug!(
            method = %outbound.method,
            url = %outbound.url,
            "Forwarding upstream"
        );

        let upstream = self.forwarder.forward(outbound).await?;

        if let Some(redirect) = self.redirects.rewrite(upstream.status, &upstream.headers, &origin) {
            tracing::debug!(
                status = %redirect.status,
                location = ?redirect.headers.get(axum::http::header::LOCATION),
                "Rewrote redirect"
            );
            return Ok((redirect.into_response(), Handled::Redirect));
        }

        let (response, outcome) = self.responses.rewrite(upstream, &origin).await;
        Ok((response.into_response(), Handled::Response(outcome)))
    }
}
