//! API Gateway
//!
//! Single entry point for browser clients: routes by path to logical
//! services or the front-end, rewriting paths on the way.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────────┐
//!                              │                      API GATEWAY                          │
//!                              │                                                           │
//!     Client Request           │  ┌─────────┐    ┌─────────┐    ┌──────────────┐          │
//!     ─────────────────────────┼─▶│  http   │───▶│  cors   │───▶│   routing    │          │
//!                              │  │ server  │    │ filter  │    │ match+rewrite│          │
//!                              │  └─────────┘    └─────────┘    └──────┬───────┘          │
//!                              │                                       │                   │
//!                              │                                       ▼                   │
//!                              │                               ┌──────────────┐           │
//!                              │                               │load_balancer │           │
//!                              │                               │  (resolver)  │           │
//!                              │                               └──────┬───────┘           │
//!                              │                                       │                   │
//!                              │                                       ▼                   │
//!     Client Response          │  ┌─────────┐    ┌─────────┐    ┌──────────────┐          │
//!     ◀────────────────────────┼──│response │◀───│  http   │◀───│   upstream   │◀─────────┼──── users-service
//!                              │  │ + CORS  │    │ client  │    │   request    │          │     sales-service
//!                              │  └─────────┘    └─────────┘    └──────────────┘          │     front-end
//!                              │                                                           │
//!                              │  ┌─────────────────────────────────────────────────────┐ │
//!                              │  │              Cross-Cutting Concerns                  │ │
//!                              │  │  ┌─────────┐ ┌────────┐ ┌──────────┐ ┌───────────┐  │ │
//!                              │  │  │ config  │ │ health │ │observa-  │ │ security  │  │ │
//!                              │  │  │ +reload │ │ checks │ │ bility   │ │ headers   │  │ │
//!                              │  │  └─────────┘ └────────┘ └──────────┘ └───────────┘  │ │
//!                              │  │  ┌─────────────────┐  ┌─────────────────────────┐   │ │
//!                              │  │  │   resilience    │  │       lifecycle         │   │ │
//!                              │  │  │ timeout/retry   │  │   signals/shutdown      │   │ │
//!                              │  │  └─────────────────┘  └─────────────────────────┘   │ │
//!                              │  └─────────────────────────────────────────────────────┘ │
//!                              └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use api_gateway::config::{load_or_default, watcher::ConfigWatcher};
use api_gateway::lifecycle::{signals::spawn_signal_handler, Shutdown};
use api_gateway::observability::{logging, metrics};
use api_gateway::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "api-gateway")]
#[command(about = "Path-routing API gateway", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_or_default(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        frontend = %config.frontend.uri,
        routes = config.route_table().len(),
        services = config.services.len(),
        request_timeout_secs = config.timeouts.request_secs,
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

    // The watcher must outlive the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(handle) => (Some(handle), updates),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
                    (None, updates)
                }
            }
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
