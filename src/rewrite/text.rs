//! Upstream-hostname substitution in textual bodies.
//!
//! Three ordered passes, each case-insensitive and global:
//! 1. `http(s)://upstream` → proxy origin
//! 2. `//upstream` → `//proxy-hostname`
//! 3. `"http(s)://upstream` → `"` + proxy origin
//!
//! Each pass runs on the output of the previous one. Replacements are
//! literal, so `$` in an origin is never expanded.

use std::borrow::Cow;

use regex::{NoExpand, Regex, RegexBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("invalid rewrite pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Compiled substitution passes for one upstream host.
#[derive(Debug, Clone)]
pub struct TextRewriter {
    absolute: Regex,
    protocol_relative: Regex,
    quoted: Regex,
}

impl TextRewriter {
    pub fn new(upstream_host: &str) -> Result<Self, RewriteError> {
        let host = regex::escape(upstream_host);
        Ok(Self {
            absolute: case_insensitive(&format!("https?://{}", host))?,
            protocol_relative: case_insensitive(&format!("//{}", host))?,
            quoted: case_insensitive(&format!("\"https?://{}", host))?,
        })
    }

    /// Rewrite `text` so upstream references point at the proxy.
    ///
    /// Returns `Cow::Borrowed` when nothing matched.
    pub fn rewrite<'a>(&self, text: &'a str, proxy_origin: &str, proxy_hostname: &str) -> Cow<'a, str> {
        let relative = format!("//{}", proxy_hostname);
        let quoted = format!("\"{}", proxy_origin);

        let text = self.absolute.replace_all(text, NoExpand(proxy_origin));
        let text = replace_all(text, &self.protocol_relative, &relative);
        replace_all(text, &self.quoted, &quoted)
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

fn replace_all<'a>(text: Cow<'a, str>, pattern: &Regex, replacement: &str) -> Cow<'a, str> {
    match text {
        Cow::Borrowed(text) => pattern.replace_all(text, NoExpand(replacement)),
        Cow::Owned(text) => {
            let replaced = match pattern.replace_all(&text, NoExpand(replacement)) {
                Cow::Owned(replaced) => Some(replaced),
                Cow::Borrowed(_) => None,
            };
            Cow::Owned(replaced.unwrap_or(text))
        }
    }
}

/// One-shot rewrite. Falls back to the untouched input if the passes cannot
/// be built.
pub fn rewrite_text<'a>(
    body: &'a str,
    proxy_origin: &str,
    proxy_hostname: &str,
    upstream_host: &str,
) -> Cow<'a, str> {
    match TextRewriter::new(upstream_host) {
        Ok(rewriter) => rewriter.rewrite(body, proxy_origin, proxy_hostname),
        Err(e) => {
            tracing::warn!(error = %e, upstream_host, "Text rewrite skipped");
            Cow::Borrowed(body)
        }
    }
}
