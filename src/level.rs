//! Severity threshold policy and display projections.
//!
//! All lookups take the raw numeric severity so values coming from untyped
//! call sites still resolve (to the `????` / `white` sentinels).

use ticklog_config::Severity;

/// Label shown for a value outside the four known severities.
pub const UNKNOWN_LABEL: &str = "????";
/// Color hint used for a value outside the four known severities.
pub const UNKNOWN_COLOR: &str = "white";

/// Whether a message at `request` is emitted under `threshold`.
pub fn should_emit(request: u8, threshold: Severity) -> bool {
    request <= threshold.value()
}

/// Four-character tag for a severity value.
pub fn label(value: u8) -> &'static str {
    match Severity::from_value(value) {
        Some(Severity::Error) => "ERRO",
        Some(Severity::Warn) => "WARN",
        Some(Severity::Info) => "INFO",
        Some(Severity::Debug) => "DBUG",
        None => UNKNOWN_LABEL,
    }
}

/// Color hint for a severity value.
pub fn color_hint(value: u8) -> &'static str {
    match Severity::from_value(value) {
        Some(Severity::Error) => "red",
        Some(Severity::Warn) => "yellow",
        Some(Severity::Info) => "blue",
        Some(Severity::Debug) => "green",
        None => UNKNOWN_COLOR,
    }
}
