//! Response body rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream response
//!     → content.rs (textual or binary?)
//!     → binary: stream through untouched
//!     → textual: body.rs (buffer up to the limit)
//!                → text.rs (substitute upstream host references)
//! ```
//!
//! # Design Decisions
//! - Rewriting is best effort; any failure delivers the original bytes
//! - Outcomes are typed so callers can tell "nothing to do" from "failed"

pub mod body;
pub mod content;
pub mod text;

pub use body::{buffer_body, BodyRewriteFailure, BodyStream, BoxError, Buffered};
pub use content::{is_textual, is_textual_response};
pub use text::{rewrite_text, RewriteError, TextRewriter};

/// What happened to a response body on its way through the proxy.
#[derive(Debug)]
pub enum RewriteOutcome {
    /// Binary content, streamed without inspection.
    Passthrough,
    /// Textual content with no upstream references.
    Unchanged,
    /// Textual content with upstream references replaced.
    Rewritten,
    /// Textual content delivered unmodified because rewriting failed.
    Failed(BodyRewriteFailure),
}

impl RewriteOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RewriteOutcome::Passthrough => "passthrough",
            RewriteOutcome::Unchanged => "unchanged",
            RewriteOutcome::Rewritten => "rewritten",
            RewriteOutcome::Failed(_) => "failed",
        }
    }
}
