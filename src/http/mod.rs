//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → handler.rs (one pipeline per request)
//!         → origin.rs (public URL the client used)
//!         → request.rs (outbound request, sanitized headers)
//!         → forward.rs (single upstream attempt)
//!         → redirect.rs (Location rewriting, short-circuit)
//!         → response.rs (header sanitization, body rewriting)
//!     → Send to client
//! ```

pub mod forward;
pub mod handler;
pub mod origin;
pub mod redirect;
pub mod request;
pub mod request_id;
pub mod response;
pub mod server;

pub use handler::ProxyHandler;
pub use origin::ProxyOrigin;
pub use request_id::X_REQUEST_ID;
pub use server::HttpServer;
