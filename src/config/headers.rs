//! Header directive parsing.
//!
//! # Responsibilities
//! - Parse `key: value` strings from the CLI or config file
//! - Reject entries that do not split into exactly two parts
//! - Produce the mapping injected into the WebSocket handshake
//!
//! # Design Decisions
//! - Repeated keys overwrite: last entry wins
//! - A trailing empty value does not count as a part (`"k: "` is rejected)
//! - Validity as an HTTP header is checked later, when the handshake
//!   request is built

use std::collections::BTreeMap;

use crate::config::loader::ConfigError;

/// Separator between header name and value.
pub const HEADER_SEPARATOR: &str = ": ";

/// Parsed handshake headers: name → single-element value list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderDirectives(BTreeMap<String, Vec<String>>);

impl HeaderDirectives {
    /// Look up the values for a header name.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }
}

/// Parse a list of `"<key>: <value>"` entries.
pub fn parse_headers<S: AsRef<str>>(entries: &[S]) -> Result<HeaderDirectives, ConfigError> {
    let mut map = BTreeMap::new();

    for entry in entries {
        let (key, value) = parse_one(entry.as_ref())?;
        map.insert(key.to_string(), vec![value.to_string()]);
    }

    Ok(HeaderDirectives(map))
}

fn parse_one(entry: &str) -> Result<(&str, &str), ConfigError> {
    let mut parts: Vec<&str> = entry.split(HEADER_SEPARATOR).collect();
    while parts.len() > 1 && parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }

    match parts.as_slice() {
        [key, value] if !key.is_empty() => Ok((key, value)),
        _ => Err(ConfigError::Header(entry.to_string())),
    }
}
