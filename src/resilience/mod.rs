//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (enforce the upstream deadline)
//!     → on expiry: ProxyError::UpstreamTimeout → 500
//! ```
//!
//! # Design Decisions
//! - Single attempt per request; nothing is retried
//! - Every upstream call has a deadline

pub mod timeouts;
