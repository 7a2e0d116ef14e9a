//! Command line surface.
//!
//! Flags override values read from `--config`; the merged result is
//! validated once.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::{BridgeConfig, UnsolicitedPolicy};
use crate::config::validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "ws-bridge")]
#[command(about = "Serve HTTP requests by forwarding them over a single WebSocket session", long_about = None)]
pub struct Cli {
    /// HTTP listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Backend WebSocket url
    #[arg(short, long)]
    pub url: Option<String>,

    /// Handshake header, "key: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Echo payloads and log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind the HTTP listener on
    #[arg(long)]
    pub bind: Option<String>,

    /// Seconds to wait for a backend reply
    #[arg(long)]
    pub reply_timeout: Option<u64>,

    /// Seconds a request may queue behind the one in flight
    #[arg(long)]
    pub queue_timeout: Option<u64>,

    /// Seconds allowed for the WebSocket handshake
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Policy for backend messages received before a request was sent
    #[arg(long, value_enum)]
    pub unsolicited: Option<UnsolicitedPolicy>,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    pub metrics_address: Option<String>,
}

impl Cli {
    /// Merge file config (if any) with flags and validate the result.
    pub fn into_config(self) -> Result<BridgeConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => read_config(path)?,
            None => BridgeConfig::default(),
        };
        let config = self.apply(base);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    fn apply(self, mut config: BridgeConfig) -> BridgeConfig {
        if let Some(port) = self.port {
            config.listener.port = Some(port);
        }
        if let Some(host) = self.bind {
            config.listener.bind_host = host;
        }
        if let Some(url) = self.url {
            config.upstream.url = Some(url);
        }
        // CLI headers are appended so they win over file entries with the same key
        config.upstream.headers.extend(self.headers);
        if let Some(secs) = self.connect_timeout {
            config.upstream.connect_timeout_secs = secs;
        }
        if let Some(secs) = self.reply_timeout {
            config.bridge.reply_timeout_secs = secs;
        }
        if let Some(secs) = self.queue_timeout {
            config.bridge.queue_timeout_secs = secs;
        }
        if let Some(policy) = self.unsolicited {
            config.bridge.unsolicited = policy;
        }
        if self.verbose {
            config.observability.verbose = true;
        }
        if let Some(addr) = self.metrics_address {
            config.observability.metrics_address = Some(addr);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_flags() {
        let cli = Cli::try_parse_from(["ws-bridge", "-p", "8080", "-u", "ws://localhost:9001"]).unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.listener.port, Some(8080));
        assert_eq!(config.upstream.url.as_deref(), Some("ws://localhost:9001"));
        assert!(config.upstream.headers.is_empty());
        assert!(!config.observability.verbose);
    }

    #[test]
    fn test_repeated_headers_and_verbose() {
        let cli = Cli::try_parse_from([
            "ws-bridge",
            "--port",
            "8080",
            "--url",
            "wss://backend.example/ws",
            "-H",
            "Authorization: Bearer abc",
            "--header",
            "X-Client: curl",
            "-v",
            "--unsolicited",
            "deliver",
        ])
        .unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.upstream.headers.len(), 2);
        assert!(config.observability.verbose);
        assert_eq!(config.bridge.unsolicited, UnsolicitedPolicy::Deliver);
    }

    #[test]
    fn test_missing_port_is_config_error() {
        let cli = Cli::try_parse_from(["ws-bridge", "-u", "ws://localhost:9001"]).unwrap();
        assert!(matches!(cli.into_config(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_non_integer_port_rejected_by_parser() {
        assert!(Cli::try_parse_from(["ws-bridge", "-p", "eighty", "-u", "ws://x"]).is_err());
    }

    #[test]
    fn test_flags_override_file_values() {
        let mut file = BridgeConfig::default();
        file.listener.port = Some(1000);
        file.upstream.url = Some("ws://file.example".to_string());
        file.upstream.headers = vec!["X-Key: file".to_string()];

        let cli = Cli::try_parse_from(["ws-bridge", "-p", "2000", "-H", "X-Key: cli"]).unwrap();
        let config = cli.apply(file);

        assert_eq!(config.listener.port, Some(2000));
        assert_eq!(config.upstream.url.as_deref(), Some("ws://file.example"));
        let headers = crate::config::headers::parse_headers(&config.upstream.headers).unwrap();
        assert_eq!(headers.get("X-Key"), Some(&["cli".to_string()][..]));
    }
}
