//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Derive default filter directives from the observability config
//!
//! # Design Decisions
//! - `RUST_LOG` always wins over configured defaults
//! - Verbose mode raises the bridge to debug, which is where payloads are logged

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Default filter directives when `RUST_LOG` is unset.
pub fn default_directives(config: &ObservabilityConfig) -> String {
    if config.verbose {
        "ws_bridge=debug,tower_http=debug".to_string()
    } else {
        format!("ws_bridge={},tower_http=warn", config.log_level.to_ascii_lowercase())
    }
}

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directives(config).into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
