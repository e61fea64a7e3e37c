//! Payout relay (v1)
//!
//! HTTP façade over a resilient transaction broadcasting engine for an
//! Osmosis-style Cosmos chain.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────────┐
//!                   │                     PAYOUT RELAY                     │
//!   JSON request    │  ┌─────────┐   ┌─────────────────┐                   │
//!  ─────────────────┼─▶│  http   │──▶│ TransferService │                   │
//!                   │  │ façade  │   └────────┬────────┘                   │
//!                   │  └─────────┘            │                            │
//!                   │                         ▼                            │
//!                   │              ┌─────────────────────┐                 │
//!                   │              │  FailoverExecutor   │◀── classifier   │
//!                   │              │  (EndpointPool)     │                 │
//!                   │              └──────────┬──────────┘                 │
//!                   │       one attempt per   │ current endpoint           │
//!                   │                         ▼                            │
//!                   │  aggregator → fees (simulate) → sign → submitter ────┼──▶ node REST
//!                   │                                                      │
//!                   │  config · observability · lifecycle                  │
//!                   └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use payout_relay::lifecycle::{signals, startup, Shutdown};
use payout_relay::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "payout-relay", version, about = "Resilient payout broadcasting relay")]
struct Args {
    /// Path to a TOML configuration file; defaults are used without one.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = startup::load(args.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("payout-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        endpoints = config.node.endpoints.len(),
        chain_id = %config.node.chain_id,
        request_timeout_secs = config.security.request_timeout_secs,
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

    let (server, listener) = startup::bootstrap(&config).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let _signals = signals::spawn_signal_listener(&shutdown);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
