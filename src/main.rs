//! HyperMon Proxy server binary.
//!
//! ```bash
//! # Listen on the default 0.0.0.0:5000
//! hypermon-proxy
//!
//! # Different port, verbose logging, original lookup behaviour
//! hypermon-proxy --port 8080 -v --second-row-fallback
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hypermon_proxy::{serve, AppState, ProxyConfig};

/// JSON relay for AllStarLink node pages.
#[derive(Parser)]
#[command(name = "hypermon-proxy")]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    config: ProxyConfig,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = cli.config;
    config.validate()?;

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("HyperMon Proxy Server starting");
    info!("Listening on http://{}", listener.local_addr()?);
    info!("Endpoints:");
    info!("   - GET /api/keyed-nodes");
    info!("   - GET /api/search-nodes?q=CALLSIGN");
    info!("   - GET /api/node-info/<node_number>");
    info!("   - GET /health");
    info!(keyed = %config.keyed_url, search = %config.search_url, timeout_secs = config.timeout_secs, "Upstreams");

    let state = AppState::new(config).context("failed to build HTTP client")?;
    serve(listener, state, shutdown_signal()).await?;

    info!("Shut down");
    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("hypermon_proxy=debug,info")
        } else {
            EnvFilter::new("hypermon_proxy=info,warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed.
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C received, stopping");
}
