//! Request/response correlator.
//!
//! # Responsibilities
//! - Serialize request cycles (one send-through-receive at a time)
//! - Forward the request body over the upstream session
//! - Wait for the next reply from the slot, bounded by the reply timeout
//! - Wake the waiting caller if the session closes or fails
//!
//! # Design Decisions
//! - Correlation is positional: the reply is the next message after the send
//! - The critical section is a FIFO async mutex held across send and receive
//! - Callers queue for at most `queue_timeout`, then get `Busy`
//! - State is checked before and after entering the critical section so a
//!   dead session fails fast instead of parking callers on the slot
//! - `reply_timeout` bounds the send and the wait together

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::bridge::error::BridgeError;
use crate::bridge::slot::ReplyReceiver;
use crate::config::CycleConfig;
use crate::upstream::state::wait_terminal;
use crate::upstream::{SessionState, Upstream};

/// Bridges one HTTP request at a time onto the upstream session.
pub struct Correlator {
    upstream: Arc<dyn Upstream>,
    /// The slot receiver doubles as the request-level lock.
    replies: Mutex<ReplyReceiver>,
    reply_timeout: Duration,
    queue_timeout: Duration,
}

impl Correlator {
    /// Create a correlator over an upstream and the consumer half of its slot.
    pub fn new(
        upstream: Arc<dyn Upstream>,
        replies: ReplyReceiver,
        reply_timeout: Duration,
        queue_timeout: Duration,
    ) -> Self {
        Self {
            upstream,
            replies: Mutex::new(replies),
            reply_timeout,
            queue_timeout,
        }
    }

    /// Create a correlator using the timeouts from `config`.
    pub fn from_config(upstream: Arc<dyn Upstream>, replies: ReplyReceiver, config: &CycleConfig) -> Self {
        Self::new(upstream, replies, config.reply_timeout(), config.queue_timeout())
    }

    /// Current upstream state.
    pub fn session_state(&self) -> SessionState {
        self.upstream.state()
    }

    /// Run one request cycle: send `body`, return the next message received.
    pub async fn forward_and_await_reply(&self, body: String) -> Result<String, BridgeError> {
        self.ensure_open()?;

        let mut replies = match timeout(self.queue_timeout, self.replies.lock()).await {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!(
                    queue_timeout_ms = self.queue_timeout.as_millis() as u64,
                    "Request rejected: previous cycle still in flight"
                );
                return Err(BridgeError::Busy(self.queue_timeout));
            }
        };

        // The session may have died while we were queued
        self.ensure_open()?;

        let cycle = replies.begin_cycle();
        let started = Instant::now();
        // Subscribe before sending so a close during the send is not missed
        let state_rx = self.upstream.watch_state();

        tracing::debug!(cycle, bytes = body.len(), "Forwarding request");
        let exchange = async {
            self.upstream.send(body).await.map_err(|e| {
                tracing::error!(cycle, error = %e, "Forward failed");
                BridgeError::from(e)
            })?;

            tokio::select! {
                biased;
                reply = replies.recv(cycle) => reply.ok_or(BridgeError::Unavailable(SessionState::Closed)),
                state = wait_terminal(state_rx) => Err(BridgeError::Unavailable(state)),
            }
        };

        // The reply timeout covers a send stalled on a congested socket too
        let result = match timeout(self.reply_timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Timeout(self.reply_timeout)),
        };
        replies.end_cycle();

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(reply) => tracing::debug!(
                cycle,
                bytes = reply.len(),
                elapsed_ms,
                discarded_total = replies.discarded(),
                "Reply received"
            ),
            Err(e) => tracing::warn!(cycle, elapsed_ms, error = %e, "Request cycle failed"),
        }
        result
    }

    fn ensure_open(&self) -> Result<(), BridgeError> {
        let state = self.upstream.state();
        if state.is_open() {
            Ok(())
        } else {
            Err(BridgeError::Unavailable(state))
        }
    }
}

impl std::fmt::Debug for Correlator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Correlator")
            .field("state", &self.upstream.state())
            .field("reply_timeout", &self.reply_timeout)
            .field("queue_timeout", &self.queue_timeout)
            .finish()
    }
}
