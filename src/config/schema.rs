//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// HTTP listener settings.
    pub listener: ListenerConfig,

    /// Backend WebSocket settings.
    pub upstream: UpstreamConfig,

    /// Request cycle settings (timeouts, unsolicited policy, body limit).
    pub bridge: CycleConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or IP to bind (e.g., "0.0.0.0").
    pub bind_host: String,

    /// Listen port. Required; there is no default.
    pub port: Option<u16>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: None,
        }
    }
}

impl ListenerConfig {
    /// `host:port` string for binding. Only meaningful after validation.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port.unwrap_or_default())
    }
}

/// Backend WebSocket configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Backend WebSocket URI (`ws://` or `wss://`). Required.
    pub url: Option<String>,

    /// Extra handshake headers, each `"key: value"`.
    pub headers: Vec<String>,

    /// Opening handshake timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            headers: Vec::new(),
            connect_timeout_secs: 10,
        }
    }
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// What to do with a message that arrived before the current cycle sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnsolicitedPolicy {
    /// Discard it when the next cycle reads the slot.
    #[default]
    Drop,
    /// Hand it to the next cycle as its reply.
    Deliver,
}

/// Request cycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Maximum wait for a backend reply, in seconds.
    pub reply_timeout_secs: u64,

    /// Maximum wait to enter the request critical section, in seconds.
    pub queue_timeout_secs: u64,

    /// Unsolicited message policy.
    pub unsolicited: UnsolicitedPolicy,

    /// Maximum HTTP request body in bytes.
    pub max_body_size: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            reply_timeout_secs: 30,
            queue_timeout_secs: 30,
            unsolicited: UnsolicitedPolicy::Drop,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

impl CycleConfig {
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }

    pub fn queue_timeout(&self) -> Duration {
        Duration::from_secs(self.queue_timeout_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Echo payloads and raise the log level to debug.
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Prometheus exporter bind address. Disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_level: "info".to_string(),
            metrics_address: None,
        }
    }
}

impl ObservabilityConfig {
    /// Parsed metrics address, if configured and valid.
    pub fn metrics_socket_addr(&self) -> Option<SocketAddr> {
        self.metrics_address.as_deref().and_then(|a| a.parse().ok())
    }
}
