//! Configuration validation.
//!
//! Serde handles syntax; this checks values. Every problem is reported,
//! not just the first one.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let host = config.upstream.host.trim();
    if host.is_empty() {
        errors.push(ValidationError::new("upstream.host", "must not be empty"));
    } else if host.contains("://") {
        errors.push(ValidationError::new(
            "upstream.host",
            format!("'{}' must be a bare host, without scheme", host),
        ));
    } else if host.contains(&['/', '?', '#'][..]) || host.chars().any(char::is_whitespace) {
        errors.push(ValidationError::new(
            "upstream.host",
            format!("'{}' must not contain a path, query or whitespace", host),
        ));
    } else if url::Url::parse(&config.upstream.origin()).is_err() {
        errors.push(ValidationError::new(
            "upstream.host",
            format!("'{}' does not form a valid origin", host),
        ));
    }

    if !matches!(config.upstream.scheme.as_str(), "https" | "http") {
        errors.push(ValidationError::new(
            "upstream.scheme",
            format!("unsupported scheme '{}'", config.upstream.scheme),
        ));
    }

    if !matches!(config.listener.public_scheme.as_str(), "https" | "http") {
        errors.push(ValidationError::new(
            "listener.public_scheme",
            format!("unsupported scheme '{}'", config.listener.public_scheme),
        ));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::new("timeouts.upstream_secs", "must be greater than 0"));
    }

    if config.limits.max_text_body_bytes == 0 {
        errors.push(ValidationError::new(
            "limits.max_text_body_bytes",
            "must be greater than 0",
        ));
    }

    for name in &config.security.strip_request_headers {
        if axum::http::HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "security.strip_request_headers",
                format!("'{}' is not a valid header name", name),
            ));
        }
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}'", config.observability.log_format),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
