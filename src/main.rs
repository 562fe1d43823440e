//! Path router server.
//!
//! ```text
//! router.toml ──▶ loader ──▶ HttpServer ──▶ Router::reload ──▶ RouteTable
//!      │                                                          ▲
//!      └── watcher (on change) ──▶ set_routes + reload ───────────┘
//!
//! Client ──▶ axum (request id, timeout, trace) ──▶ Dispatcher ──▶ handler
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use path_router::config::{load_config, ConfigWatcher};
use path_router::lifecycle::signals::shutdown_signal;
use path_router::observability::{logging::init_logging, metrics::init_metrics};
use path_router::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "path-router")]
#[command(about = "Serve configured routes matched by regular expression", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "router.toml")]
    config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,

    /// Do not reload routes when the configuration file changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    init_logging(&config.observability.log_level);

    tracing::info!(
        path = ?cli.config,
        routes = config.routes.len(),
        bind_address = %config.listener.bind_address,
        removal_policy = ?config.reload.removal_policy,
        "Configuration loaded"
    );

    let server = HttpServer::new(config)?;
    if cli.check {
        tracing::info!("Configuration is valid");
        return Ok(());
    }

    let config = server.config();
    if config.observability.metrics_enabled {
        init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The watcher stops when its guard is dropped.
    let (updates, _watch_guard) = if config.reload.watch && !cli.no_watch {
        let (watcher, updates) = ConfigWatcher::new(&cli.config);
        (updates, Some(watcher.run()?))
    } else {
        let (_, updates) = mpsc::unbounded_channel();
        (updates, None)
    };

    let shutdown = Shutdown::new();
    let stopped = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, updates, stopped).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
