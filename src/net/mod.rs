//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig (host, port)
//!     → listener.rs (resolve, bind)
//!     → Hand off to HTTP layer (axum::serve)
//! ```
//!
//! # Design Decisions
//! - Bound before the upstream handshake so port problems fail fast
//! - No TLS here: HTTPS termination is left to a fronting proxy

pub mod listener;

pub use listener::{bind, ListenerError};
