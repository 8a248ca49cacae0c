use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use routing_proxy::config::{loader, validation, ConfigError, ProxyConfig};
use routing_proxy::observability::{logging, metrics};
use routing_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "routing-proxy")]
#[command(about = "Reverse proxy with path-scoped request/response modifiers", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides [backend] url
    #[arg(short, long)]
    backend: Option<String>,

    /// Bind address, overrides [listener] bind_address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => loader::read_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(backend) = cli.backend {
        config.backend.url = backend;
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validation::validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability.log_level);
    tracing::info!("routing-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.url,
        modifiers = config.modifiers.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Already validated.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    // The chain is built here, before the listener accepts anything.
    let server = HttpServer::new(config.clone())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
