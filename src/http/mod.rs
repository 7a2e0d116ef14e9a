//! HTTP front door.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, body limit)
//!     → decode.rs (UTF-8, line normalization, percent decoding)
//!     → bridge::Correlator (one request cycle)
//!     → response.rs (reply as text/plain, or error status)
//!     → Send to client
//! ```

pub mod decode;
pub mod response;
pub mod server;

pub use decode::{decode_body, DecodeError};
pub use server::HttpServer;
