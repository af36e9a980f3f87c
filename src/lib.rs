// Library exports for the ticklog leveled logger.
//
// Data flows one way: a call enters `Logger`, is checked against the level
// policy, formatted, rendered (possibly remapping an error stack) and either
// dropped or written to the sink.

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod diagnostics;
pub mod format;
pub mod level;
pub mod logger;
pub mod render;
pub mod sink;
pub mod stack_mapper;

pub use format::{Arg, FormatError};
pub use logger::{Logger, LoggerBuilder, TICK_FAILURE_MESSAGE};
pub use render::{LogRequest, RenderKind, RenderedLine, Renderer, SIMULATOR_NOTICE};
pub use sink::{LogBridgeSink, MemorySink, Sink, StdoutSink};
pub use stack_mapper::{
    OriginalPosition, PassthroughMapper, ScriptError, SourceMap, SourceMapError,
    SourceMapStackMapper, StackMapper,
};

// Configuration types live in their own crate; re-export the common ones.
pub use ticklog_config::{
    ConfigError, HostEnvironment, LoggerConfig, RenderTarget, SandboxRenderMode, Severity,
};
