//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated configuration into a running bridge
//! - Initialize subsystems in dependency order
//! - Serve until shutdown, then close the upstream session
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener is bound before the handshake, but serving starts only after
//!   the session is open
//! - The session is closed after the server has drained

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::bridge::{reply_slot, Correlator};
use crate::config::{parse_headers, BridgeConfig, ConfigError};
use crate::config::validation::ValidationError;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::net::{self, ListenerError};
use crate::observability::metrics;
use crate::upstream::{Session, SessionError};

/// Errors that abort startup or serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Handshake(#[from] SessionError),

    #[error("Failed to start metrics exporter: {0}")]
    Metrics(String),

    #[error("HTTP server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// A bridge whose listener is bound and whose session is open.
pub struct Bridge {
    listener: TcpListener,
    local_addr: SocketAddr,
    session: Arc<Session>,
    server: HttpServer,
}

impl Bridge {
    /// Address the HTTP listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The upstream session.
    pub fn session(&self) -> Arc<Session> {
        self.session.clone()
    }

    /// Serve HTTP until `shutdown` fires, then close the session.
    pub async fn serve(self, shutdown: broadcast::Receiver<()>) -> Result<(), StartupError> {
        let result = self.server.run(self.listener, shutdown).await;
        self.session.close().await;
        result.map_err(StartupError::from)
    }
}

/// Bind, connect and assemble the bridge without serving yet.
pub async fn start(config: &BridgeConfig) -> Result<Bridge, StartupError> {
    // 1. Header directives and target
    let headers = parse_headers(&config.upstream.headers)?;
    let url = config
        .upstream
        .url
        .as_deref()
        .ok_or_else(|| ConfigError::Validation(vec![ValidationError::MissingUrl]))?;

    // 2. Listener first so port problems surface before the handshake
    let listener = net::bind(&config.listener).await?;
    let local_addr = listener.local_addr()?;

    // 3. Upstream session feeding the reply slot
    let (replies_tx, replies_rx) = reply_slot(config.bridge.unsolicited);
    let session = Arc::new(
        Session::connect(url, &headers, config.upstream.connect_timeout(), replies_tx).await?,
    );

    // 4. Correlator and front door
    let correlator = Arc::new(Correlator::from_config(session.clone(), replies_rx, &config.bridge));
    let server = HttpServer::new(correlator, config.bridge.max_body_size);

    // 5. Metrics exporter
    if let Some(addr) = config.observability.metrics_socket_addr() {
        metrics::init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
    }

    tracing::info!(
        address = %local_addr,
        upstream = %session.uri(),
        unsolicited = ?config.bridge.unsolicited,
        reply_timeout_secs = config.bridge.reply_timeout_secs,
        "Bridge ready"
    );

    Ok(Bridge {
        listener,
        local_addr,
        session,
        server,
    })
}

/// Start the bridge and serve until SIGINT/SIGTERM.
pub async fn run(config: BridgeConfig) -> Result<(), StartupError> {
    let bridge = start(&config).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::trigger_on_signal(shutdown));

    bridge.serve(server_shutdown).await
}
