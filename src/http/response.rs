//! Response handling and transformation.
//!
//! # Responsibilities
//! - Sanitize upstream response headers (CORS, security policies, hop-by-hop)
//! - Rewrite upstream references in textual bodies
//! - Stream binary bodies through untouched
//!
//! # Design Decisions
//! - Binary responses are never buffered
//! - Textual responses are buffered up to a limit; past it they stream
//! - Rewrite failures deliver the original bytes, never an error

use std::borrow::Cow;

use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::{stream, StreamExt};

use crate::http::forward::UpstreamResponse;
use crate::http::origin::ProxyOrigin;
use crate::rewrite::{
    buffer_body, is_textual_response, BodyRewriteFailure, BodyStream, BoxError, Buffered,
    RewriteOutcome, TextRewriter,
};
use crate::security::headers::sanitize_response_headers;

/// Body of a response produced by the proxy.
pub enum ProxyBody {
    Empty,
    Full(Bytes),
    Stream(BodyStream),
    /// Bytes already read, followed by the rest of the original stream.
    Resumed { prefix: Bytes, rest: BodyStream },
    /// Bytes already read, followed by the read error that cut them short.
    Broken { prefix: Bytes, error: BoxError },
}

impl ProxyBody {
    pub fn into_body(self) -> Body {
        match self {
            ProxyBody::Empty => Body::empty(),
            ProxyBody::Full(bytes) => Body::from(bytes),
            ProxyBody::Stream(body) => Body::from_stream(body),
            ProxyBody::Resumed { prefix, rest } => {
                Body::from_stream(stream::once(async move { Ok::<_, BoxError>(prefix) }).chain(rest))
            }
            ProxyBody::Broken { prefix, error } => {
                Body::from_stream(stream::iter(vec![Ok::<_, BoxError>(prefix), Err(error)]))
            }
        }
    }
}

impl std::fmt::Debug for ProxyBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyBody::Empty => f.write_str("Empty"),
            ProxyBody::Full(bytes) => write!(f, "Full({} bytes)", bytes.len()),
            ProxyBody::Stream(_) => f.write_str("Stream"),
            ProxyBody::Resumed { prefix, .. } => write!(f, "Resumed({} bytes + stream)", prefix.len()),
            ProxyBody::Broken { prefix, error } => write!(f, "Broken({} bytes, {})", prefix.len(), error),
        }
    }
}

/// A response ready to be returned to the client.
#[derive(Debug)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ProxyBody,
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(self.body.into_body());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Turns upstream responses into client responses.
#[derive(Debug, Clone)]
pub struct ResponseRewriter {
    text: TextRewriter,
    max_text_body_bytes: usize,
}

impl ResponseRewriter {
    pub fn new(text: TextRewriter, max_text_body_bytes: usize) -> Self {
        Self {
            text,
            max_text_body_bytes,
        }
    }

    pub async fn rewrite(&self, upstream: UpstreamResponse, proxy: &ProxyOrigin) -> (ProxyResponse, RewriteOutcome) {
        let UpstreamResponse {
            status,
            headers,
            body,
        } = upstream;
        let mut headers = sanitize_response_headers(headers);

        if !is_textual_response(&headers) {
            return (
                ProxyResponse {
                    status,
                    headers,
                    body: ProxyBody::Stream(body),
                },
                RewriteOutcome::Passthrough,
            );
        }

        if declared_length(&headers).is_some_and(|len| len > self.max_text_body_bytes) {
            let failure = BodyRewriteFailure::TooLarge {
                limit: self.max_text_body_bytes,
            };
            tracing::debug!(reason = %failure, "Streaming textual body unmodified");
            return (
                ProxyResponse {
                    status,
                    headers,
                    body: ProxyBody::Stream(body),
                },
                RewriteOutcome::Failed(failure),
            );
        }

        let (body, outcome) = match buffer_body(body, self.max_text_body_bytes).await {
            Buffered::Complete(bytes) => match self.rewrite_text(&bytes, proxy) {
                Ok(Some(rewritten)) => {
                    headers.remove(header::CONTENT_LENGTH);
                    (ProxyBody::Full(Bytes::from(rewritten)), RewriteOutcome::Rewritten)
                }
                Ok(None) => (ProxyBody::Full(bytes), RewriteOutcome::Unchanged),
                Err(failure) => (ProxyBody::Full(bytes), RewriteOutcome::Failed(failure)),
            },
            Buffered::Exceeded { prefix, rest, limit } => (
                ProxyBody::Resumed { prefix, rest },
                RewriteOutcome::Failed(BodyRewriteFailure::TooLarge { limit }),
            ),
            Buffered::Failed { prefix, error } => {
                let failure = BodyRewriteFailure::Read(error.to_string());
                (ProxyBody::Broken { prefix, error }, RewriteOutcome::Failed(failure))
            }
        };

        if let RewriteOutcome::Failed(failure) = &outcome {
            tracing::warn!(reason = %failure, "Delivering textual body unmodified");
        }

        (ProxyResponse { status, headers, body }, outcome)
    }

    /// `Ok(None)` when the text holds no upstream references.
    fn rewrite_text(&self, bytes: &[u8], proxy: &ProxyOrigin) -> Result<Option<String>, BodyRewriteFailure> {
        let text = std::str::from_utf8(bytes)?;
        match self.text.rewrite(text, &proxy.origin(), proxy.hostname()) {
            Cow::Owned(rewritten) => Ok(Some(rewritten)),
            Cow::Borrowed(_) => Ok(None),
        }
    }
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
