//! Offline-first caching proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http server ──▶ routing ──┬─▶ precache (revisioned)
//!                                                 ├─▶ route strategy ──┐
//!                                                 └─▶ default strategy ┤
//!                                                                      ▼
//!                                            net fetcher ◀──▶ runtime cache
//!                                                                      │
//!     Client Response                         catch handler on failure ◀┘
//!     ◀──────────────── (entry point / cached asset / network error)
//!
//!     config watcher ──▶ waiting deployment ──SKIP_WAITING──▶ active
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use offline_proxy::config::watcher::ConfigWatcher;
use offline_proxy::config::{load_config, ProxyConfig};
use offline_proxy::observability::{logging, metrics};
use offline_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "offline-proxy")]
#[command(about = "Offline-first caching proxy", long_about = None)]
struct Args {
    /// Path to the TOML configuration file; defaults are used when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "offline-proxy starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.origin,
        routes = config.routes.len(),
        precache_entries = config.precache.entries.len(),
        release = %config.deployment.release,
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

    // Hot reload; the watcher must stay alive for the lifetime of the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, &config);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move { shutdown.trigger_on_signal().await });

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
