//! Upstream WebSocket subsystem (connection lifecycle manager).
//!
//! # Data Flow
//! ```text
//! Startup:
//!     session.rs connect(url, headers)
//!     → handshake (bounded by connect timeout)
//!     → state.rs Connecting → Open
//!     → reader task spawned
//!
//! Reader task:
//!     text frame → ReplySender::on_message (may wait on a full slot)
//!     close/EOF  → Closed
//!     error      → Errored
//! ```
//!
//! # Design Decisions
//! - Exactly one session per process, no reconnection
//! - The correlator depends on the `Upstream` trait, not on the socket
//! - Only the session changes its own lifecycle; everyone else observes

pub mod session;
pub mod state;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

pub use session::Session;
pub use state::{SessionEvent, SessionState, StateCell};

/// Errors raised by the upstream session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Opening handshake failed (DNS, refused, protocol negotiation).
    #[error("WebSocket handshake with {uri} failed: {reason}")]
    Handshake { uri: String, reason: String },

    /// Opening handshake exceeded the connect timeout.
    #[error("WebSocket handshake with {uri} timed out after {secs} seconds")]
    HandshakeTimeout { uri: String, secs: u64 },

    /// A header directive is not a valid HTTP header.
    #[error("Invalid handshake header '{0}'")]
    InvalidHeader(String),

    /// Send attempted while the session is not open.
    #[error("WebSocket session is {0}")]
    NotOpen(SessionState),

    /// Write failed mid-session.
    #[error("WebSocket transport error: {0}")]
    Transport(String),
}

/// The operations the correlator needs from the backend connection.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Forward one text message.
    async fn send(&self, text: String) -> Result<(), SessionError>;

    /// Current connection state.
    fn state(&self) -> SessionState;

    /// Follow state changes.
    fn watch_state(&self) -> watch::Receiver<SessionState>;
}
