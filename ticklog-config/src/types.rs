//! Configuration enums shared by the logger and its settings file.
//!
//! - `Severity`         : the four ordered message urgencies
//! - `RenderTarget`     : presentation convention for emitted lines
//! - `HostEnvironment`  : live host vs. simulated host
//! - `SandboxRenderMode`: how error lines render on a simulated host

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Message severity.
///
/// Lower numeric value means higher urgency, so `Error` is shown under every
/// threshold and `Debug` only under the most verbose one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Severity {
    Error = 0,
    Warn = 1,
    #[default]
    Info = 2,
    Debug = 3,
}

impl Severity {
    /// Numeric value used for threshold comparison.
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Map a raw numeric value back to a severity, if it names one.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Severity::Error),
            1 => Some(Severity::Warn),
            2 => Some(Severity::Info),
            3 => Some(Severity::Debug),
            _ => None,
        }
    }

    /// Display name for help text and diagnostics
    pub fn display_name(&self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::Warn => "Warn",
            Severity::Info => "Info",
            Severity::Debug => "Debug",
        }
    }

    /// All severities, most urgent first.
    pub fn all() -> &'static [Severity] {
        &[
            Severity::Error,
            Severity::Warn,
            Severity::Info,
            Severity::Debug,
        ]
    }

    /// Convert to the equivalent `log::Level`.
    pub fn to_log_level(self) -> log::Level {
        match self {
            Severity::Error => log::Level::Error,
            Severity::Warn => log::Level::Warn,
            Severity::Info => log::Level::Info,
            Severity::Debug => log::Level::Debug,
        }
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.value()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Error returned when a severity string cannot be recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity '{0}' (expected error, warn, info, debug or 0-3)")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<u8>() {
            return Severity::from_value(value)
                .ok_or_else(|| ParseSeverityError(trimmed.to_string()));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "error" | "err" | "erro" => Ok(Severity::Error),
            "warn" | "warning" => Ok(Severity::Warn),
            "info" => Ok(Severity::Info),
            "debug" | "dbug" => Ok(Severity::Debug),
            _ => Err(ParseSeverityError(trimmed.to_string())),
        }
    }
}

/// Presentation convention used for emitted lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenderTarget {
    /// `<span style='color:...'>` markup understood by web consoles
    #[default]
    Markup,
    /// ANSI SGR color codes for terminals
    Ansi,
    /// Undecorated text
    Plain,
}

/// Error returned when a render target string cannot be recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown render target '{0}' (expected markup, ansi or plain)")]
pub struct ParseRenderTargetError(pub String);

impl FromStr for RenderTarget {
    type Err = ParseRenderTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "markup" | "html" => Ok(RenderTarget::Markup),
            "ansi" => Ok(RenderTarget::Ansi),
            "plain" | "text" => Ok(RenderTarget::Plain),
            _ => Err(ParseRenderTargetError(trimmed.to_string())),
        }
    }
}

/// Host the logger runs inside.
///
/// Source-mapped stack traces are only trustworthy on a live host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HostEnvironment {
    #[default]
    Live,
    Simulated,
}

impl HostEnvironment {
    pub fn is_simulated(self) -> bool {
        self == HostEnvironment::Simulated
    }
}

/// Degraded render policy for error lines on a simulated host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SandboxRenderMode {
    /// Notice plus raw stack only; the message and caller are dropped.
    #[default]
    NoticeOnly,
    /// Notice plus raw stack, preceded by the usual label, caller and message.
    WithContext,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_values_and_ordering() {
        assert_eq!(Severity::Error.value(), 0);
        assert_eq!(Severity::Warn.value(), 1);
        assert_eq!(Severity::Info.value(), 2);
        assert_eq!(Severity::Debug.value(), 3);
        assert!(Severity::Error < Severity::Debug);
        assert_eq!(Severity::default(), Severity::Info);
    }

    #[test]
    fn test_severity_from_value_rejects_out_of_range() {
        for s in Severity::all() {
            assert_eq!(Severity::from_value(s.value()), Some(*s));
        }
        assert_eq!(Severity::from_value(4), None);
        assert_eq!(Severity::from_value(255), None);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("WARNING".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!(" debug ".parse::<Severity>().unwrap(), Severity::Debug);
        assert_eq!("0".parse::<Severity>().unwrap(), Severity::Error);
        assert!("7".parse::<Severity>().is_err());
        assert!("loud".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_to_log_level() {
        assert_eq!(Severity::Error.to_log_level(), log::Level::Error);
        assert_eq!(Severity::Debug.to_log_level(), log::Level::Debug);
    }

    #[test]
    fn test_render_target_parse() {
        assert_eq!("HTML".parse::<RenderTarget>(), Ok(RenderTarget::Markup));
        assert_eq!("ansi".parse::<RenderTarget>(), Ok(RenderTarget::Ansi));
        assert_eq!(
            " XML ".parse::<RenderTarget>(),
            Err(ParseRenderTargetError("XML".to_string()))
        );
        assert_eq!(
            ParseRenderTargetError("xml".to_string()).to_string(),
            "unknown render target 'xml' (expected markup, ansi or plain)"
        );
    }
}
