//! `LoggerConfig` and its persistence.
//!
//! Covers:
//! - YAML load/save (atomic write via temp file + rename)
//! - XDG-style default path resolution (`config_path`)
//! - Environment overrides (`TICKLOG_LEVEL`, `TICKLOG_SIMULATED`,
//!   `TICKLOG_RENDER_TARGET`)

use crate::error::ConfigError;
use crate::types::{HostEnvironment, RenderTarget, SandboxRenderMode, Severity};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding `level`.
pub const ENV_LEVEL: &str = "TICKLOG_LEVEL";
/// Environment variable forcing the simulated host environment.
pub const ENV_SIMULATED: &str = "TICKLOG_SIMULATED";
/// Environment variable overriding `render_target`.
pub const ENV_RENDER_TARGET: &str = "TICKLOG_RENDER_TARGET";

fn default_bundle_name() -> String {
    "main".to_string()
}

/// Logger settings, read once at process start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Threshold: messages less urgent than this are dropped.
    pub level: Severity,
    pub render_target: RenderTarget,
    pub environment: HostEnvironment,
    pub sandbox_render_mode: SandboxRenderMode,
    /// Name of the generated bundle as it appears in stack frames.
    #[serde(default = "default_bundle_name")]
    pub bundle_name: String,
    /// Source map used to remap stack traces, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_map_path: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Severity::default(),
            render_target: RenderTarget::default(),
            environment: HostEnvironment::default(),
            sandbox_render_mode: SandboxRenderMode::default(),
            bundle_name: default_bundle_name(),
            source_map_path: None,
        }
    }
}

impl LoggerConfig {
    /// Directory holding the ticklog config file.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ticklog")
    }

    /// Default config file location.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist. Environment overrides are applied last.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            log::info!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load and validate a config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Loading logger config from {:?}", path);
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: LoggerConfig = serde_yaml_ng::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }

        let yaml = serde_yaml_ng::to_string(self)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml).map_err(|e| ConfigError::io(&temp_path, e))?;
        fs::rename(&temp_path, path).map_err(|e| ConfigError::io(path, e))?;
        log::debug!("Saved logger config to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bundle_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "bundle_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides using `lookup` to resolve variable names.
    ///
    /// Unrecognized values are logged and ignored.
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_LEVEL) {
            match raw.parse::<Severity>() {
                Ok(level) => self.level = level,
                Err(e) => log::warn!("Ignoring {ENV_LEVEL}: {e}"),
            }
        }

        if let Some(raw) = lookup(ENV_SIMULATED) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.environment = HostEnvironment::Simulated,
                "0" | "false" | "no" | "" => self.environment = HostEnvironment::Live,
                other => log::warn!("Ignoring {ENV_SIMULATED}: unrecognized value '{other}'"),
            }
        }

        if let Some(raw) = lookup(ENV_RENDER_TARGET) {
            match raw.parse::<RenderTarget>() {
                Ok(target) => self.render_target = target,
                Err(e) => log::warn!("Ignoring {ENV_RENDER_TARGET}: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, Severity::Info);
        assert_eq!(config.render_target, RenderTarget::Markup);
        assert_eq!(config.environment, HostEnvironment::Live);
        assert_eq!(config.sandbox_render_mode, SandboxRenderMode::NoticeOnly);
        assert_eq!(config.bundle_name, "main");
        assert!(config.source_map_path.is_none());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = LoggerConfig::from_yaml("level: warn\nenvironment: simulated\n").unwrap();
        assert_eq!(config.level, Severity::Warn);
        assert_eq!(config.environment, HostEnvironment::Simulated);
        assert_eq!(config.bundle_name, "main");
    }

    #[test]
    fn test_sandbox_mode_snake_case() {
        let config = LoggerConfig::from_yaml("sandbox_render_mode: with_context\n").unwrap();
        assert_eq!(config.sandbox_render_mode, SandboxRenderMode::WithContext);
    }

    #[test]
    fn test_empty_bundle_name_rejected() {
        let err = LoggerConfig::from_yaml("bundle_name: '  '\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let err = LoggerConfig::from_yaml("level: [not, a, level]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = LoggerConfig::default();
        config.apply_overrides_with(lookup_from(&[
            (ENV_LEVEL, "debug"),
            (ENV_SIMULATED, "yes"),
            (ENV_RENDER_TARGET, "plain"),
        ]));
        assert_eq!(config.level, Severity::Debug);
        assert_eq!(config.environment, HostEnvironment::Simulated);
        assert_eq!(config.render_target, RenderTarget::Plain);
    }

    #[test]
    fn test_bad_overrides_are_ignored() {
        let mut config = LoggerConfig::default();
        config.apply_overrides_with(lookup_from(&[
            (ENV_LEVEL, "shouty"),
            (ENV_SIMULATED, "maybe"),
            (ENV_RENDER_TARGET, "xml"),
        ]));
        assert_eq!(config, LoggerConfig::default());
    }
}
