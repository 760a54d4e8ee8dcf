//! Session configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SessionResult;

/// What to do with bytes that match no known frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationPolicy {
    /// Append to the reassembly buffer, whatever its state.
    #[default]
    Append,
    /// Append only while a batch is open; drop orphan chunks otherwise.
    DropWhenIdle,
}

/// Configuration for a reader session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session name, used as a log prefix and metric label.
    pub name: String,
    /// Pause between initialization commands (milliseconds).
    pub command_delay_ms: u64,
    /// Largest batch the reassembly buffer may hold before it is discarded.
    pub max_buffer_len: usize,
    /// Reject frames whose payload is longer than their length indicator.
    pub validate_length: bool,
    /// Handling of unclassified chunks.
    pub continuation: ContinuationPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            name: "reader".to_string(),
            command_delay_ms: 0,
            max_buffer_len: 4096,
            validate_length: false,
            continuation: ContinuationPolicy::Append,
        }
    }
}

impl SessionConfig {
    /// Parse a YAML document. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> SessionResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> SessionResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> SessionResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.name, "reader");
        assert_eq!(config.max_buffer_len, 4096);
        assert!(!config.validate_length);
        assert_eq!(config.continuation, ContinuationPolicy::Append);
    }

    #[test]
    fn test_config_partial_yaml() {
        let config = SessionConfig::from_yaml_str(
            "name: dock-3\nvalidate_length: true\ncontinuation: drop_when_idle\n",
        )
        .unwrap();
        assert_eq!(config.name, "dock-3");
        assert!(config.validate_length);
        assert_eq!(config.continuation, ContinuationPolicy::DropWhenIdle);
        assert_eq!(config.command_delay_ms, 0);
    }

    #[test]
    fn test_config_yaml_roundtrip() {
        let original = SessionConfig {
            name: "gate".to_string(),
            command_delay_ms: 50,
            max_buffer_len: 1024,
            validate_length: true,
            continuation: ContinuationPolicy::DropWhenIdle,
        };
        let yaml = original.to_yaml().unwrap();
        assert_eq!(SessionConfig::from_yaml_str(&yaml).unwrap(), original);
    }

    #[test]
    fn test_config_invalid_yaml() {
        assert!(SessionConfig::from_yaml_str("max_buffer_len: lots").is_err());
    }
}
