//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming the upstream host.
pub const ENV_UPSTREAM_HOST: &str = "UPSTREAM_HOST";
/// Environment variable naming the upstream scheme.
pub const ENV_UPSTREAM_SCHEME: &str = "UPSTREAM_SCHEME";
/// Environment variable naming the listener bind address.
pub const ENV_BIND: &str = "PROXY_BIND";
/// Environment variable naming the scheme clients use to reach the proxy.
pub const ENV_PUBLIC_SCHEME: &str = "PROXY_PUBLIC_SCHEME";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML file into a configuration without validating it.
pub fn read_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides on top of a file-based or default config.
///
/// `lookup` abstracts `std::env::var` so overrides can be exercised in tests.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(host) = non_empty(ENV_UPSTREAM_HOST) {
        config.upstream.host = host;
    }
    if let Some(scheme) = non_empty(ENV_UPSTREAM_SCHEME) {
        config.upstream.scheme = scheme.to_ascii_lowercase();
    }
    if let Some(bind) = non_empty(ENV_BIND) {
        config.listener.bind_address = bind;
    }
    if let Some(scheme) = non_empty(ENV_PUBLIC_SCHEME) {
        config.listener.public_scheme = scheme.to_ascii_lowercase();
    }
}

/// Build the startup configuration: optional file, then environment, then
/// validation.
pub fn load_startup_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
