//! ws-bridge
//!
//! Exposes an HTTP endpoint and forwards every request body over a single
//! WebSocket session, answering with the next message the backend sends.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────────────┐
//!                         │                      WS BRIDGE                        │
//!                         │                                                       │
//!   HTTP Request          │  ┌─────────┐   ┌─────────┐   ┌────────────┐           │
//!   ──────────────────────┼─▶│  http   │──▶│ decode  │──▶│ correlator │───────────┼──▶ text frame
//!                         │  │ server  │   │  body   │   │ (1 cycle)  │  session  │
//!                         │  └─────────┘   └─────────┘   └─────┬──────┘           │
//!                         │                                    │ waits            │
//!                         │                                    ▼                  │
//!   HTTP Response         │  ┌──────────┐                ┌────────────┐  reader   │
//!   ◀─────────────────────┼──│ response │◀───────────────│ reply slot │◀──────────┼─── text frame
//!                         │  └──────────┘                │ (cap. 1)   │           │
//!                         │                              └────────────┘           │
//!                         │  config · lifecycle · observability                   │
//!                         └───────────────────────────────────────────────────────┘
//! ```

use clap::Parser;

use ws_bridge::config::Cli;
use ws_bridge::lifecycle::startup;
use ws_bridge::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ws-bridge: {}", e);
            std::process::exit(2);
        }
    };

    logging::init_logging(&config.observability);

    tracing::info!("ws-bridge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        upstream = config.upstream.url.as_deref().unwrap_or_default(),
        headers = config.upstream.headers.len(),
        verbose = config.observability.verbose,
        "Configuration loaded"
    );

    if let Err(e) = startup::run(config).await {
        tracing::error!(error = %e, "Bridge stopped with error");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
