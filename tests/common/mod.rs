//! Shared integration test helpers for ticklog.
//!
//! Include with `mod common;` at the top of a test file. The
//! `#[allow(dead_code)]` suppresses warnings when a file only uses a subset.

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;
use ticklog::{Logger, LoggerBuilder, MemorySink, Severity};

/// Source map with two generated lines:
/// - line 1: col 0 -> src/main.ts:1:0, col 10 -> src/main.ts:5:2 (`loop`)
/// - line 2: col 5 -> src/creep.ts:10:4 (`harvest`), col 20 -> src/creep.ts:10:8
pub const SAMPLE_MAP_JSON: &str = r#"{
    "version": 3,
    "file": "main.js",
    "sources": ["src/main.ts", "src/creep.ts"],
    "names": ["loop", "harvest"],
    "mappings": "AAAA,UAIEA;KCKEC,eAAI"
}"#;

/// Raw stack whose first two frames are in the `main` bundle.
pub const SAMPLE_STACK: &str =
    "Error: boom\n    at harvest (main:2:7)\n    at Object.loop (main:1:12)\n    at __module (runtime:10:3)";

/// Writes the sample source map into a fresh temp dir.
///
/// Keep the `TempDir` alive until the map has been loaded.
pub fn write_sample_map() -> (PathBuf, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("main.js.map");
    std::fs::write(&path, SAMPLE_MAP_JSON).expect("Failed to write source map");
    (path, temp_dir)
}

/// Logger at `threshold` writing into a shared in-memory sink.
pub fn memory_logger(threshold: Severity) -> (Logger, MemorySink) {
    memory_logger_with(Logger::builder().threshold(threshold))
}

/// Finish `builder` with an in-memory sink.
pub fn memory_logger_with(builder: LoggerBuilder) -> (Logger, MemorySink) {
    let sink = MemorySink::new();
    let logger = builder.sink(sink.clone()).build();
    (logger, sink)
}
