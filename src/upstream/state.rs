//! Session state machine.
//!
//! # States
//! - Connecting: handshake in progress
//! - Open: messages may be sent and received
//! - Closed: close frame or end of stream observed (terminal)
//! - Errored: transport failure observed (terminal)
//!
//! # State Transitions
//! ```text
//! Connecting → Open:    handshake completed
//! Connecting → Errored: handshake failed
//! Open → Closed:        close frame / stream ended / local close
//! Open → Errored:       read or write failure
//! ```
//!
//! # Design Decisions
//! - Terminal states are sticky; there is no reconnection
//! - Transitions go through a pure function so they are testable in isolation
//! - Observers follow changes through a watch channel

use tokio::sync::watch;

use crate::observability::metrics;

/// Connection state of the upstream session.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting = 0,
    Open = 1,
    Closed = 2,
    Errored = 3,
}

/// Transport events that drive the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Opened,
    Closed,
    Failed,
}

impl SessionState {
    /// Next state for `event`, or `None` if the event does not apply.
    pub fn apply(self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent as E;
        use SessionState as S;

        match (self, event) {
            (S::Connecting, E::Opened) => Some(S::Open),
            (S::Connecting, E::Failed) => Some(S::Errored),
            (S::Connecting, E::Closed) => Some(S::Closed),
            (S::Open, E::Closed) => Some(S::Closed),
            (S::Open, E::Failed) => Some(S::Errored),
            _ => None,
        }
    }

    pub fn is_open(self) -> bool {
        self == SessionState::Open
    }

    /// True for states the session can never leave.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Errored)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Connecting => "connecting",
            SessionState::Open => "open",
            SessionState::Closed => "closed",
            SessionState::Errored => "errored",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, observable holder of the session state.
#[derive(Debug)]
pub struct StateCell {
    tx: watch::Sender<SessionState>,
}

impl StateCell {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionState::Connecting);
        metrics::record_session_state(SessionState::Connecting);
        Self { tx }
    }

    /// Current state.
    pub fn current(&self) -> SessionState {
        *self.tx.borrow()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Apply an event. Returns the new state if a transition happened.
    pub fn fire(&self, event: SessionEvent) -> Option<SessionState> {
        let mut next = None;
        self.tx.send_if_modified(|state| match state.apply(event) {
            Some(to) => {
                tracing::debug!(from = %state, to = %to, ?event, "Session state transition");
                *state = to;
                next = Some(to);
                true
            }
            None => false,
        });

        if let Some(state) = next {
            metrics::record_session_state(state);
        }
        next
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once the observed state becomes terminal.
///
/// A dropped sender counts as `Closed`.
pub async fn wait_terminal(mut rx: watch::Receiver<SessionState>) -> SessionState {
    loop {
        let state = *rx.borrow_and_update();
        if state.is_terminal() {
            return state;
        }
        if rx.changed().await.is_err() {
            return SessionState::Closed;
        }
    }
}
