//! Script errors and stack-trace remapping.
//!
//! A [`StackMapper`] turns the raw stack of a [`ScriptError`] raised by the
//! hosted (bundled, minified) script into a trace that points at original
//! source positions. Mappers are total: when nothing can be remapped they
//! still return the error header.

pub mod source_map;


use lru::LruCache;
use parking_lot::Mutex;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::OnceLock;

use crate::format::FormatError;
pub use source_map::{OriginalPosition, SourceMap, SourceMapError};

// ---------------------------------------------------------------------------
// ScriptError
// ---------------------------------------------------------------------------

/// An error raised by the hosted script, with its stack text if one was
/// captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    name: String,
    message: String,
    stack: Option<String>,
}

impl ScriptError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    /// Rebuild an error from captured stack text.
    ///
    /// The first line is the header (`Name: message`, or just `Name`).
    pub fn from_stack(stack: &str) -> Self {
        let header = stack.lines().next().unwrap_or("").trim();
        let (name, message) = match header.split_once(": ") {
            Some((name, message)) => (name, message),
            None => (header, ""),
        };
        let name = if name.is_empty() { "Error" } else { name };
        ScriptError::new(name, message).with_stack(stack)
    }

    /// Attach the raw stack text (header line followed by `at ...` frames).
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// The raw stack, or the header line when no stack was captured.
    pub fn stack_or_header(&self) -> Cow<'_, str> {
        match &self.stack {
            Some(stack) => Cow::Borrowed(stack.as_str()),
            None => Cow::Owned(self.to_string()),
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

impl std::error::Error for ScriptError {}

impl From<&FormatError> for ScriptError {
    fn from(e: &FormatError) -> Self {
        ScriptError::new("FormatError", e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Mappers
// ---------------------------------------------------------------------------

/// Renders an error's call stack in original-source coordinates.
pub trait StackMapper: Send + Sync {
    fn source_mapped_stack_trace(&self, error: &ScriptError) -> String;
}

/// Mapper that performs no remapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughMapper;

impl StackMapper for PassthroughMapper {
    fn source_mapped_stack_trace(&self, error: &ScriptError) -> String {
        error.stack_or_header().into_owned()
    }
}

/// JavaScript frame: `    at name (file:line:col)` or `    at file:line:col`.
///
/// CRLF mode so captures saved with `\r\n` line endings match every frame.
fn re_js_frame() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?mR)^\s+at\s+(.+?\s+)?\(?([\w.\-\\/]+):(\d+):(\d+)\)?$")
            .expect("frame regex is a compile-time constant and must be valid")
    })
}

/// Number of remapped traces kept by [`SourceMapStackMapper::new`].
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Cache key: error header plus raw stack text.
type CacheKey = (String, String);

/// Remaps frames of the generated bundle through a [`SourceMap`].
///
/// Only the leading run of bundle frames is remapped; the walk stops at the
/// first frame from another file or without a mapping. Results are memoized
/// per error header and raw stack in a bounded LRU cache, since the same
/// error tends to repeat every tick.
pub struct SourceMapStackMapper {
    map: SourceMap,
    bundle_name: String,
    cache: Mutex<LruCache<CacheKey, String>>,
}

impl SourceMapStackMapper {
    pub fn new(map: SourceMap, bundle_name: impl Into<String>) -> Self {
        Self::with_capacity(map, bundle_name, DEFAULT_CACHE_CAPACITY)
    }

    /// Mapper keeping at most `capacity` remapped traces (minimum 1).
    pub fn with_capacity(map: SourceMap, bundle_name: impl Into<String>, capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            map,
            bundle_name: bundle_name.into(),
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    /// Number of memoized traces.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    fn remap(&self, error: &ScriptError, stack: &str) -> String {
        let mut out = error.to_string();

        for caps in re_js_frame().captures_iter(stack) {
            let file = caps.get(2).map_or("", |m| m.as_str());
            if file != self.bundle_name {
                break;
            }
            let (Some(line), Some(column)) = (
                caps.get(3).and_then(|m| m.as_str().parse::<u32>().ok()),
                caps.get(4).and_then(|m| m.as_str().parse::<u32>().ok()),
            ) else {
                break;
            };
            let Some(pos) = self.map.original_position_for(line, column) else {
                break;
            };

            let frame_name = caps.get(1).map(|m| m.as_str().trim());
            match (pos.name.as_deref(), frame_name) {
                (Some(name), _) | (None, Some(name)) => out.push_str(&format!(
                    "\n    at {} ({}:{}:{})",
                    name, pos.source, pos.line, pos.column
                )),
                (None, None) => out.push_str(&format!(
                    "\n    at {}:{}:{}",
                    pos.source, pos.line, pos.column
                )),
            }
        }

        out
    }
}

impl StackMapper for SourceMapStackMapper {
    fn source_mapped_stack_trace(&self, error: &ScriptError) -> String {
        let Some(stack) = error.stack() else {
            return error.to_string();
        };

        let key = (error.to_string(), stack.to_string());
        if let Some(hit) = self.cache.lock().get(&key) {
            return hit.clone();
        }

        log::debug!("Remapping stack trace for {}", error.name());
        let mapped = self.remap(error, stack);
        self.cache.lock().put(key, mapped.clone());
        mapped
    }
}

impl fmt::Debug for SourceMapStackMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceMapStackMapper")
            .field("bundle_name", &self.bundle_name)
            .field("cached", &self.cached_len())
            .field("capacity", &self.cache.lock().cap())
            .finish()
    }
}
