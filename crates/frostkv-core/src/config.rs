//! Runtime configuration.
//!
//! Every key is optional. An empty document yields the defaults:
//!
//! ```toml
//! debug = false
//! record_locks = false
//! lock_stripes = 64
//! max_batch_commands = 0   # 0 = unlimited
//!
//! [memory]
//! max_connections = 16
//! ```

use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

///
/// Config
///

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Emit per-operation state transitions at `info` instead of `debug`.
    pub debug: bool,

    /// Serialize save/delete of the same record inside this process.
    pub record_locks: bool,

    pub lock_stripes: usize,

    /// Upper bound on commands in one submitted batch; 0 disables the check.
    pub max_batch_commands: usize,

    pub memory: MemoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            record_locks: false,
            lock_stripes: 64,
            max_batch_commands: 0,
            memory: MemoryConfig::default(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.record_locks && self.lock_stripes == 0 {
            return Err(ConfigError::Invalid(
                "lock_stripes must be greater than 0 when record_locks is enabled".to_string(),
            ));
        }
        if self.memory.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "memory.max_connections must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

///
/// MemoryConfig
/// Settings for the in-process `MemoryStore`.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryConfig {
    pub max_connections: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_connections: 16,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = Config::from_toml_str("").expect("empty config should parse");

        assert_eq!(config, Config::default());
        assert_eq!(config.lock_stripes, 64);
        assert_eq!(config.memory.max_connections, 16);
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_toml_str(
            r"
            record_locks = true
            lock_stripes = 8
            max_batch_commands = 100

            [memory]
            max_connections = 2
            ",
        )
        .expect("config should parse");

        assert!(config.record_locks);
        assert_eq!(config.lock_stripes, 8);
        assert_eq!(config.max_batch_commands, 100);
        assert_eq!(config.memory.max_connections, 2);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("retry = true").expect_err("unknown key should fail");

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_stripes_with_locks_is_invalid() {
        let err = Config::from_toml_str("record_locks = true\nlock_stripes = 0")
            .expect_err("zero stripes should fail");

        assert!(err.to_string().contains("lock_stripes"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::load("/nonexistent/frostkv.toml").expect_err("missing file");

        assert!(matches!(err, ConfigError::Io { ref path, .. } if path.contains("frostkv.toml")));
    }
}
