//! Request ID generation.
//!
//! Every inbound request gets an `x-request-id` (kept if the client sent
//! one) that is echoed on the response. Only a client-supplied ID travels
//! upstream; a generated one would reveal the proxy.

use axum::extract::Request as AxumRequest;
use axum::http::{Extensions, HeaderMap, HeaderName, Request};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::request_id::{MakeRequestId, RequestId};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        id.parse().ok().map(RequestId::new)
    }
}

/// Marker extension: the client sent its own `x-request-id`.
#[derive(Debug, Clone, Copy)]
pub struct ClientRequestId;

/// Runs ahead of ID generation and records whether the client supplied one.
pub async fn mark_client_request_id(mut request: AxumRequest, next: Next) -> Response {
    if request.headers().contains_key(X_REQUEST_ID) {
        request.extensions_mut().insert(ClientRequestId);
    }
    next.run(request).await
}

/// Remove the `x-request-id` header unless the client sent it.
pub fn strip_generated_request_id(headers: &mut HeaderMap, extensions: &Extensions) {
    if extensions.get::<ClientRequestId>().is_none() {
        headers.remove(X_REQUEST_ID);
    }
}

/// Read the request ID attached to a request, if any.
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
