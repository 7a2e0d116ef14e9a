//! Request cycle errors.

use std::time::Duration;

use thiserror::Error;

use crate::upstream::{SessionError, SessionState};

/// Errors a request cycle can end with.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The session is not open; the bridge refuses to forward.
    #[error("Backend session unavailable ({0})")]
    Unavailable(SessionState),

    /// Another request held the critical section for longer than allowed.
    #[error("Bridge busy: no slot within {} ms", .0.as_millis())]
    Busy(Duration),

    /// Sending over the session failed.
    #[error("Backend transport failed: {0}")]
    Transport(#[source] SessionError),

    /// No reply arrived in time.
    #[error("No reply from backend within {} ms", .0.as_millis())]
    Timeout(Duration),
}

impl BridgeError {
    /// Label used for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            BridgeError::Unavailable(_) => "unavailable",
            BridgeError::Busy(_) => "busy",
            BridgeError::Transport(_) => "transport_error",
            BridgeError::Timeout(_) => "timeout",
        }
    }
}

impl From<SessionError> for BridgeError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotOpen(state) => BridgeError::Unavailable(state),
            other => BridgeError::Transport(other),
        }
    }
}
