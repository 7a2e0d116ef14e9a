//! HTTP to WebSocket bridge library.
//!
//! Serves synchronous HTTP requests by forwarding each body over one
//! persistent WebSocket session and answering with the next message the
//! backend sends.

// Core subsystems
pub mod bridge;
pub mod config;
pub mod http;
pub mod net;
pub mod upstream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use bridge::{BridgeError, Correlator};
pub use config::BridgeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use upstream::{Session, SessionState, Upstream};
