//! The `Logger` facade.
//!
//! A logger owns a fixed threshold, a [`Renderer`] and a [`Sink`]. The
//! per-severity methods format their template, identify the call site and
//! hand the result to [`Logger::log`]. Caller identity is the source
//! location of the call (via `#[track_caller]`) unless one is passed
//! explicitly.

use std::borrow::Cow;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use ticklog_config::{HostEnvironment, LoggerConfig, RenderTarget, SandboxRenderMode, Severity};

use crate::format::{Arg, format};
use crate::level;
use crate::render::{LogRequest, Renderer};
use crate::sink::{Sink, StdoutSink};
use crate::stack_mapper::{ScriptError, SourceMap, SourceMapError, SourceMapStackMapper, StackMapper};

/// Message used when a tick body returns an error.
pub const TICK_FAILURE_MESSAGE: &str = "unhandled error in tick";

/// `file:line:col` of the nearest non-`#[track_caller]` caller.
#[track_caller]
fn caller_identity() -> String {
    let location = Location::caller();
    format!(
        "{}:{}:{}",
        location.file(),
        location.line(),
        location.column()
    )
}

/// Leveled logger for a tick-driven host.
pub struct Logger {
    threshold: Severity,
    renderer: Renderer,
    sink: Box<dyn Sink>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Logger {
    /// Logger writing markup lines to stdout. `None` selects `Severity::Info`.
    pub fn new(threshold: Option<Severity>) -> Self {
        LoggerBuilder::new().threshold_opt(threshold).build()
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Logger configured from `config`, writing to stdout.
    ///
    /// Fails only if the configured source map cannot be loaded.
    pub fn from_config(config: &LoggerConfig) -> Result<Self, SourceMapError> {
        Ok(LoggerBuilder::from_config(config)?.build())
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Whether a message at `severity` would be emitted.
    pub fn is_enabled(&self, severity: Severity) -> bool {
        level::should_emit(severity.value(), self.threshold)
    }

    #[track_caller]
    pub fn debug(&self, template: &str, args: &[Arg<'_>]) {
        self.log_formatted(Severity::Debug, template, args, &caller_identity());
    }

    #[track_caller]
    pub fn info(&self, template: &str, args: &[Arg<'_>]) {
        self.log_formatted(Severity::Info, template, args, &caller_identity());
    }

    #[track_caller]
    pub fn warn(&self, template: &str, args: &[Arg<'_>]) {
        self.log_formatted(Severity::Warn, template, args, &caller_identity());
    }

    #[track_caller]
    pub fn error(&self, template: &str, args: &[Arg<'_>]) {
        self.log_formatted(Severity::Error, template, args, &caller_identity());
    }

    /// Log an already formatted message, optionally with an error trace.
    ///
    /// `caller` defaults to the source location of this call.
    #[track_caller]
    pub fn log(
        &self,
        severity: Severity,
        message: &str,
        error: Option<&ScriptError>,
        caller: Option<&str>,
    ) {
        self.log_value(severity.value(), message, error, caller);
    }

    /// Like [`Logger::log`], for severities coming from untyped call sites.
    #[track_caller]
    pub fn log_value(
        &self,
        severity: u8,
        message: &str,
        error: Option<&ScriptError>,
        caller: Option<&str>,
    ) {
        let caller = match caller {
            Some(c) => Cow::Borrowed(c),
            None => Cow::Owned(caller_identity()),
        };
        self.dispatch(severity, message, error, &caller);
    }

    /// Run one tick body and log its error, if any, at `Severity::Error`.
    ///
    /// The body's result is handed back unchanged.
    #[track_caller]
    pub fn run_tick<F>(&self, body: F) -> Result<(), ScriptError>
    where
        F: FnOnce() -> Result<(), ScriptError>,
    {
        let caller = caller_identity();
        let result = body();
        if let Err(e) = &result {
            self.dispatch(Severity::Error.value(), TICK_FAILURE_MESSAGE, Some(e), &caller);
        }
        result
    }

    fn log_formatted(&self, severity: Severity, template: &str, args: &[Arg<'_>], caller: &str) {
        let message = match format(template, args) {
            Ok(formatted) => Cow::Owned(formatted),
            Err(e) => {
                log::debug!("Template {template:?} rejected: {e}");
                // Reported without arguments, so this cannot recurse.
                let error = ScriptError::from(&e);
                self.dispatch(Severity::Warn.value(), "", Some(&error), caller);
                Cow::Borrowed(template)
            }
        };
        self.dispatch(severity.value(), &message, None, caller);
    }

    fn dispatch(&self, severity: u8, message: &str, error: Option<&ScriptError>, caller: &str) {
        let request = LogRequest {
            severity,
            caller: caller.trim(),
            message,
            error,
        };
        if let Some(line) = self.renderer.render(&request, self.threshold) {
            self.sink.write_line(&line.text);
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("threshold", &self.threshold)
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Logger`].
pub struct LoggerBuilder {
    threshold: Option<Severity>,
    renderer: Renderer,
    sink: Option<Box<dyn Sink>>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            threshold: None,
            renderer: Renderer::default(),
            sink: None,
        }
    }

    /// Builder preloaded from `config`, including its source map if set.
    pub fn from_config(config: &LoggerConfig) -> Result<Self, SourceMapError> {
        let mut builder = Self::new()
            .threshold(config.level)
            .target(config.render_target)
            .environment(config.environment)
            .sandbox_mode(config.sandbox_render_mode);

        if let Some(path) = &config.source_map_path {
            let map = SourceMap::from_path(path)?;
            log::info!("Loaded source map {:?} for bundle '{}'", path, config.bundle_name);
            builder = builder.mapper(Arc::new(SourceMapStackMapper::new(
                map,
                config.bundle_name.clone(),
            )));
        }
        Ok(builder)
    }

    pub fn threshold(self, threshold: Severity) -> Self {
        self.threshold_opt(Some(threshold))
    }

    /// `None` keeps the default threshold.
    pub fn threshold_opt(mut self, threshold: Option<Severity>) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn target(mut self, target: RenderTarget) -> Self {
        self.renderer = self.renderer.with_target(target);
        self
    }

    pub fn environment(mut self, environment: HostEnvironment) -> Self {
        self.renderer = self.renderer.with_environment(environment);
        self
    }

    pub fn sandbox_mode(mut self, mode: SandboxRenderMode) -> Self {
        self.renderer = self.renderer.with_sandbox_mode(mode);
        self
    }

    pub fn mapper(mut self, mapper: Arc<dyn StackMapper>) -> Self {
        self.renderer = self.renderer.with_mapper(mapper);
        self
    }

    pub fn sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn build(self) -> Logger {
        Logger {
            threshold: self.threshold.unwrap_or_default(),
            renderer: self.renderer,
            sink: self.sink.unwrap_or_else(|| Box::new(StdoutSink)),
        }
    }
}

// Call-site macros: `tl_info!(logger, "{0} of {1}", a, b)`.

#[macro_export]
macro_rules! tl_error {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $logger.error($template, &[$($crate::Arg::from(&$arg)),*])
    };
}

#[macro_export]
macro_rules! tl_warn {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $logger.warn($template, &[$($crate::Arg::from(&$arg)),*])
    };
}

#[macro_export]
macro_rules! tl_info {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $logger.info($template, &[$($crate::Arg::from(&$arg)),*])
    };
}

#[macro_export]
macro_rules! tl_debug {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $logger.debug($template, &[$($crate::Arg::from(&$arg)),*])
    };
}
