//! Typed error variants for the ticklog-config crate.
//!
//! Callers can match on the failure mode instead of inspecting strings.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or saving a `LoggerConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An I/O error occurred reading or writing the config file.
    #[error("I/O error on config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file contained invalid YAML.
    #[error("YAML parse error in config: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    /// A field value failed semantic validation.
    #[error("Config validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}
