//! Output sinks: where rendered lines end up.

use parking_lot::Mutex;
use std::sync::Arc;

/// Synchronous line writer supplied by the host.
pub trait Sink: Send + Sync {
    fn write_line(&self, text: &str);
}

impl<F> Sink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn write_line(&self, text: &str) {
        self(text)
    }
}

/// Writes each line to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write_line(&self, text: &str) {
        println!("{text}");
    }
}

/// Forwards lines to the `log` facade under the `ticklog` target.
#[derive(Debug, Clone, Copy)]
pub struct LogBridgeSink {
    level: log::Level,
}

impl LogBridgeSink {
    pub fn new(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LogBridgeSink {
    fn default() -> Self {
        Self::new(log::Level::Info)
    }
}

impl Sink for LogBridgeSink {
    fn write_line(&self, text: &str) {
        log::log!(target: "ticklog", self.level, "{text}");
    }
}

/// Collects lines in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Remove and return everything written so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }
}

impl Sink for MemorySink {
    fn write_line(&self, text: &str) {
        self.lines.lock().push(text.to_string());
    }
}
