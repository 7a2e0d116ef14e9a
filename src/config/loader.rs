//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::BridgeConfig;
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot parse header '{0}', expected 'key: value'")]
    Header(String),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read a TOML file into an unvalidated configuration.
///
/// CLI overrides are applied on top before validation runs.
pub fn read_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse TOML text into an unvalidated configuration.
pub fn parse_config(content: &str) -> Result<BridgeConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validation::validate_config;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [listener]
            bind_host = "127.0.0.1"
            port = 8080

            [upstream]
            url = "ws://localhost:9001"
            headers = ["Authorization: Bearer abc"]

            [observability]
            verbose = true
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.upstream.headers.len(), 1);
        assert!(config.observability.verbose);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[listener]\nport = \"eighty\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = read_config(Path::new("/nonexistent/ws-bridge.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_validation_message_lists_all() {
        let err = ConfigError::Validation(vec![ValidationError::MissingPort, ValidationError::MissingUrl]);
        assert_eq!(
            err.to_string(),
            "Validation failed: listen port is required, backend url is required"
        );
    }
}
