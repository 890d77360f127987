//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → headers.rs (drop edge diagnostics, hop-by-hop)
//!     → forwarded upstream
//!
//! Upstream response:
//!     → headers.rs (force CORS, drop CSP / frame / sniffing policies)
//!     → returned to client
//! ```
//!
//! # Design Decisions
//! - Mask the proxy: nothing that identifies the edge reaches the upstream
//! - Upstream policies are scoped to its hostname and do not survive the hop

pub mod headers;
