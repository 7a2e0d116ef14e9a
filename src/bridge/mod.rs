//! Request/response correlation subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → correlator.rs forward_and_await_reply(body)
//!         → lock (queue, bounded by queue_timeout)
//!         → slot.rs begin_cycle
//!         → Upstream::send
//!         → slot.rs recv  ←── ReplySender::on_message ←── session reader
//!            (or session closed/errored, or reply_timeout)
//!         → slot.rs end_cycle
//!     ← reply text / BridgeError
//! ```
//!
//! # Design Decisions
//! - One request cycle at a time; the wire protocol carries no correlation id
//! - The slot holds one message; under `drop` the reader never waits on it,
//!   under `deliver` it waits while the slot is full
//! - Session and slot are injected, never global

pub mod correlator;
pub mod error;
pub mod slot;

pub use correlator::Correlator;
pub use error::BridgeError;
pub use slot::{reply_slot, ReplyReceiver, ReplySender};
