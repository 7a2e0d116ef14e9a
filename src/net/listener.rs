//! TCP listener for the HTTP front door.
//!
//! # Responsibilities
//! - Resolve and bind the configured `host:port`
//! - Report bind failures as a distinct, fatal startup error

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Bind the HTTP listener described by `config`.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let address = config.bind_address();
    let bind_err = |source| ListenerError::Bind {
        address: address.clone(),
        source,
    };

    let listener = TcpListener::bind(&address).await.map_err(bind_err)?;
    let local_addr: SocketAddr = listener.local_addr().map_err(bind_err)?;

    tracing::info!(address = %local_addr, "Listener bound");
    Ok(listener)
}
