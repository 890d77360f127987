//! Masking reverse proxy.
//!
//! ```text
//!     Client ──▶ listener ──▶ RequestBuilder ──▶ Forwarder ──▶ Upstream
//!                                                   │
//!     Client ◀── 3xx ◀──────────── RedirectRewriter ◀┤
//!     Client ◀── 2xx/4xx/5xx ◀──── ResponseRewriter ◀┘
//! ```
//!
//! Configuration comes from an optional TOML file, then environment
//! variables, then command-line flags.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use mirror_proxy::config::load_startup_config;
use mirror_proxy::config::validation::validate_config;
use mirror_proxy::lifecycle::signals::spawn_signal_listener;
use mirror_proxy::observability::{logging, metrics};
use mirror_proxy::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(author, version, about = "Reverse proxy that masks a single upstream origin")]
struct Args {
    /// Path to a TOML config file.
    #[arg(long, short, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Upstream host, overriding the config file and UPSTREAM_HOST.
    #[arg(long)]
    upstream_host: Option<String>,

    /// Listen address, overriding the config file and PROXY_BIND.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_startup_config(args.config.as_deref())?;
    if let Some(host) = args.upstream_host {
        config.upstream.host = host;
    }
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(mirror_proxy::config::ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;

    tracing::info!("mirror-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        upstream = %config.upstream.origin(),
        bind_address = %config.listener.bind_address,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        max_text_body_bytes = config.limits.max_text_body_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
