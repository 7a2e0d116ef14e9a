//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Required values present (port, url)
//! - Validate value ranges (timeouts > 0, port non-zero)
//! - Check the backend URI scheme and the header directives
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::headers::parse_headers;
use crate::config::schema::BridgeConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listen port is required")]
    MissingPort,

    #[error("listen port must be non-zero")]
    ZeroPort,

    #[error("backend url is required")]
    MissingUrl,

    #[error("invalid backend url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{0}")]
    Header(String),

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("unknown log level '{0}'")]
    LogLevel(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.listener.port {
        None => errors.push(ValidationError::MissingPort),
        Some(0) => errors.push(ValidationError::ZeroPort),
        Some(_) => {}
    }

    match config.upstream.url.as_deref() {
        None => errors.push(ValidationError::MissingUrl),
        Some(raw) => {
            if let Err(reason) = check_ws_url(raw) {
                errors.push(ValidationError::InvalidUrl {
                    url: raw.to_string(),
                    reason,
                });
            }
        }
    }

    if let Err(e) = parse_headers(&config.upstream.headers) {
        errors.push(ValidationError::Header(e.to_string()));
    }

    let positives = [
        ("upstream.connect_timeout_secs", config.upstream.connect_timeout_secs as u128),
        ("bridge.reply_timeout_secs", config.bridge.reply_timeout_secs as u128),
        ("bridge.queue_timeout_secs", config.bridge.queue_timeout_secs as u128),
        ("bridge.max_body_size", config.bridge.max_body_size as u128),
    ];
    for (field, value) in positives {
        if value == 0 {
            errors.push(ValidationError::NotPositive { field });
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::MetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_ws_url(raw: &str) -> Result<(), String> {
    let url = url::Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "ws" | "wss" => {}
        other => return Err(format!("scheme must be ws or wss, got '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}
