//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI flags (cli.rs)  +  optional TOML file (loader.rs)
//!     → merged BridgeConfig (flags win)
//!     → validation.rs (semantic checks, all errors reported)
//!     → headers.rs (header directives for the handshake)
//!     → BridgeConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the session cannot be reconfigured
//! - All optional fields have defaults; port and url are required
//! - Validation separates syntactic (serde, clap) from semantic checks

pub mod cli;
pub mod headers;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use headers::{parse_headers, HeaderDirectives};
pub use loader::{read_config, ConfigError};
pub use schema::{BridgeConfig, CycleConfig, ListenerConfig, ObservabilityConfig, UnsolicitedPolicy, UpstreamConfig};
