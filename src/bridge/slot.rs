//! Pending reply slot.
//!
//! # Responsibilities
//! - Hold at most one backend message awaiting a request cycle
//! - Stamp each message with the cycle that was current on receipt
//! - Apply the unsolicited-message policy
//!
//! # Design Decisions
//! - Bounded mpsc channel of capacity 1
//! - Under `deliver` a producer that finds the slot full waits for it to
//!   drain; that wait is the backpressure against a fast backend
//! - Under `drop` the producer never waits: a message with no cycle waiting
//!   for it, or arriving after the waiting cycle already has its reply, is
//!   discarded on receipt. The reader therefore keeps reading frames and
//!   sees close and error events promptly
//! - The producer's check-and-place and the consumer's cycle switch happen
//!   under one short lock, so a stale message can never occupy the slot
//!   once a new cycle is waiting
//! - Messages are never reordered

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::config::UnsolicitedPolicy;
use crate::observability::metrics;

/// Number of messages the slot can hold.
pub const SLOT_CAPACITY: usize = 1;

/// A backend message together with its receipt stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Stamped {
    cycle: u64,
    text: String,
}

/// The consumer side went away; nothing will ever drain the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("reply slot closed")]
pub struct SlotClosed;

/// Cycle bookkeeping shared by both halves.
#[derive(Debug, Default)]
struct Gate {
    /// Most recently started cycle.
    cycle: u64,
    /// Cycle currently waiting for its reply, if any.
    awaiting: Option<u64>,
}

#[derive(Debug, Default)]
struct Shared {
    gate: Mutex<Gate>,
    discarded: AtomicU64,
}

impl Shared {
    fn gate(&self) -> MutexGuard<'_, Gate> {
        // The gate holds two integers and no invariant a panic could break
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn discard(&self, cycle: u64, text: &str, reason: &'static str) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
        metrics::record_discarded_reply();
        tracing::debug!(cycle, bytes = text.len(), reason, "Discarding backend message");
    }
}

/// Create a connected producer/consumer pair.
pub fn reply_slot(policy: UnsolicitedPolicy) -> (ReplySender, ReplyReceiver) {
    let (tx, rx) = mpsc::channel(SLOT_CAPACITY);
    let shared = Arc::new(Shared::default());

    (
        ReplySender {
            tx,
            shared: shared.clone(),
            policy,
        },
        ReplyReceiver { rx, shared, policy },
    )
}

/// Producer half, owned by the session reader.
#[derive(Debug, Clone)]
pub struct ReplySender {
    tx: mpsc::Sender<Stamped>,
    shared: Arc<Shared>,
    policy: UnsolicitedPolicy,
}

impl ReplySender {
    /// Deliver a message received from the backend.
    ///
    /// Under [`UnsolicitedPolicy::Deliver`] this waits while the slot is
    /// occupied. Under [`UnsolicitedPolicy::Drop`] it returns immediately.
    pub async fn on_message(&self, text: String) -> Result<(), SlotClosed> {
        match self.policy {
            UnsolicitedPolicy::Drop => self.place_or_discard(text),
            UnsolicitedPolicy::Deliver => {
                let cycle = self.shared.gate().cycle;
                if self.tx.capacity() == 0 {
                    tracing::debug!(cycle, "Reply slot full, waiting for it to drain");
                }
                self.tx
                    .send(Stamped { cycle, text })
                    .await
                    .map_err(|_| SlotClosed)
            }
        }
    }

    fn place_or_discard(&self, text: String) -> Result<(), SlotClosed> {
        if self.tx.is_closed() {
            return Err(SlotClosed);
        }

        let gate = self.shared.gate();
        let Some(cycle) = gate.awaiting else {
            self.shared.discard(gate.cycle, &text, "no request waiting");
            return Ok(());
        };

        match self.tx.try_send(Stamped { cycle, text }) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(stamped)) => {
                self.shared.discard(cycle, &stamped.text, "cycle already answered");
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(SlotClosed),
        }
    }
}

/// Consumer half, owned by the correlator.
#[derive(Debug)]
pub struct ReplyReceiver {
    rx: mpsc::Receiver<Stamped>,
    shared: Arc<Shared>,
    policy: UnsolicitedPolicy,
}

impl ReplyReceiver {
    /// Start a new request cycle. Must be called before the request is sent.
    ///
    /// Under [`UnsolicitedPolicy::Drop`] anything still held from an earlier
    /// cycle is cleared first.
    pub fn begin_cycle(&mut self) -> u64 {
        let mut gate = self.shared.gate();
        if self.policy == UnsolicitedPolicy::Drop {
            while let Ok(stale) = self.rx.try_recv() {
                self.shared.discard(stale.cycle, &stale.text, "left over from an earlier cycle");
            }
        }
        gate.cycle += 1;
        gate.awaiting = Some(gate.cycle);
        gate.cycle
    }

    /// Mark the current cycle finished; later messages are unsolicited.
    pub fn end_cycle(&mut self) {
        self.shared.gate().awaiting = None;
    }

    /// Number of backend messages discarded so far.
    pub fn discarded(&self) -> u64 {
        self.shared.discarded.load(Ordering::Relaxed)
    }

    /// Wait for the reply to `cycle`.
    ///
    /// Under [`UnsolicitedPolicy::Drop`], messages stamped for an earlier
    /// cycle are discarded. Returns `None` once every producer is gone and
    /// the slot is empty.
    pub async fn recv(&mut self, cycle: u64) -> Option<String> {
        loop {
            let reply = self.rx.recv().await?;
            if self.policy == UnsolicitedPolicy::Drop && reply.cycle < cycle {
                self.shared.discard(reply.cycle, &reply.text, "stamped for an earlier cycle");
                continue;
            }
            return Some(reply.text);
        }
    }
}
