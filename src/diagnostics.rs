//! Diagnostics for ticklog's own operation (config loading, source map
//! decoding, template rejections).
//!
//! Library code only talks to the `log` facade. Binaries call
//! [`init_log_bridge`] once to route those records to stderr, keeping them
//! apart from the rendered log lines on stdout.
//!
//! Level precedence: explicit argument, then `TICKLOG_DIAG`, then off.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::Write;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Environment variable selecting the diagnostic level.
pub const ENV_DIAG: &str = "TICKLOG_DIAG";

/// Parse a diagnostic level name (`off`, `error`, `warn`, `info`, `debug`,
/// `trace`) or digit (0-5).
pub fn parse_level_filter(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "0" | "off" => Some(LevelFilter::Off),
        "1" | "error" => Some(LevelFilter::Error),
        "2" | "warn" | "warning" => Some(LevelFilter::Warn),
        "3" | "info" => Some(LevelFilter::Info),
        "4" | "debug" => Some(LevelFilter::Debug),
        "5" | "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

fn level_from_env() -> LevelFilter {
    std::env::var(ENV_DIAG)
        .ok()
        .and_then(|v| parse_level_filter(&v))
        .unwrap_or(LevelFilter::Off)
}

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Format one diagnostic record.
fn format_record(level: Level, target: &str, msg: &str) -> String {
    format!("[{}] [{:<5}] [{}] {}", get_timestamp(), level, target, msg)
}

struct StderrBridge;

impl Log for StderrBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(record.level(), record.target(), &record.args().to_string());
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static BRIDGE: StderrBridge = StderrBridge;
static INSTALLED: OnceLock<LevelFilter> = OnceLock::new();

/// Install the stderr bridge. Later calls keep the first level.
///
/// Returns the level in effect.
pub fn init_log_bridge(level: Option<LevelFilter>) -> LevelFilter {
    *INSTALLED.get_or_init(|| {
        let level = level.unwrap_or_else(level_from_env);
        // Another logger may already be installed by the embedding program.
        if log::set_logger(&BRIDGE).is_ok() {
            log::set_max_level(level);
        }
        level
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_filter() {
        assert_eq!(parse_level_filter("off"), Some(LevelFilter::Off));
        assert_eq!(parse_level_filter("WARNING"), Some(LevelFilter::Warn));
        assert_eq!(parse_level_filter(" 4 "), Some(LevelFilter::Debug));
        assert_eq!(parse_level_filter("trace"), Some(LevelFilter::Trace));
        assert_eq!(parse_level_filter("verbose"), None);
    }

    #[test]
    fn test_format_record_shape() {
        let line = format_record(Level::Warn, "ticklog_config", "bad value");
        assert!(line.ends_with("] [WARN ] [ticklog_config] bad value"));
        assert!(line.starts_with('['));
    }

    #[test]
    fn test_init_is_idempotent() {
        let first = init_log_bridge(Some(LevelFilter::Error));
        let second = init_log_bridge(Some(LevelFilter::Trace));
        assert_eq!(first, second);
    }
}
