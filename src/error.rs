//! Error types for the proxy pipeline.
//!
//! Only `UpstreamUnreachable`, `UpstreamTimeout` and `InvalidRequest` ever
//! reach the client; the other kinds are recovered inside the stage that
//! produces them and exist so that stage can report what happened.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;

/// Failures produced while proxying one request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// An `Origin`/`Referer` header did not parse as a URL.
    #[error("invalid {header} header: {source}")]
    InvalidHeaderValue {
        header: &'static str,
        #[source]
        source: url::ParseError,
    },

    /// The upstream could not be reached.
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    /// The upstream did not answer within the configured deadline.
    #[error("upstream did not respond within {0:?}")]
    UpstreamTimeout(Duration),

    /// A redirect `Location` could not be resolved against the upstream.
    #[error("unresolvable redirect location '{location}': {source}")]
    RedirectLocationUnparseable {
        location: String,
        #[source]
        source: url::ParseError,
    },

    /// A textual body could not be rewritten.
    #[error("body rewrite failed: {0}")]
    BodyRewriteFailure(#[from] crate::rewrite::BodyRewriteFailure),

    /// The inbound request could not be turned into an outbound one.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The proxy could not be set up from its configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl ProxyError {
    /// Label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidHeaderValue { .. } => "invalid_header_value",
            ProxyError::UpstreamUnreachable(_) => "upstream_unreachable",
            ProxyError::UpstreamTimeout(_) => "upstream_timeout",
            ProxyError::RedirectLocationUnparseable { .. } => "redirect_location_unparseable",
            ProxyError::BodyRewriteFailure(_) => "body_rewrite_failure",
            ProxyError::InvalidRequest(_) => "invalid_request",
            ProxyError::Configuration(_) => "configuration",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut response = (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Proxy request failed: {}", self),
        )
            .into_response();

        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        response
    }
}
