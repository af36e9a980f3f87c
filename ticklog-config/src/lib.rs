//! Configuration for the ticklog leveled logger.
//!
//! This crate provides:
//!
//! - The severity vocabulary shared by the logger and its settings file
//! - Render target, host environment and degraded render mode enums
//! - `LoggerConfig` YAML loading/saving with environment overrides

pub mod config;
pub mod error;
pub mod types;

pub use config::{ENV_LEVEL, ENV_RENDER_TARGET, ENV_SIMULATED, LoggerConfig};
pub use error::ConfigError;
pub use types::{
    HostEnvironment, ParseRenderTargetError, ParseSeverityError, RenderTarget, SandboxRenderMode,
    Severity,
};
