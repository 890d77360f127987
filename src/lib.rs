//! Masking reverse proxy library.
//!
//! Forwards every request to one fixed upstream origin and rewrites headers,
//! redirects and textual bodies so clients keep talking to the proxy.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod rewrite;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
