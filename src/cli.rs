//! Command-line interface for ticklog.
//!
//! Subcommands expose the pieces of the logger that are useful on their own:
//! remapping a captured stack trace, checking a template, and pushing one
//! message through a configured logger.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::diagnostics;
use crate::format::{Arg, format};
use crate::logger::LoggerBuilder;
use crate::sink::MemorySink;
use crate::stack_mapper::{ScriptError, SourceMap, SourceMapStackMapper, StackMapper};
use ticklog_config::{LoggerConfig, Severity};

/// Caller identity used for messages emitted from the command line.
pub const CLI_CALLER: &str = "ticklog-cli";

/// ticklog - leveled logging helper for tick-driven hosts
#[derive(Parser, Debug)]
#[command(name = "ticklog")]
#[command(author, version = crate::VERSION, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Diagnostic level for ticklog's own messages on stderr (off, error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remap a captured stack trace through a source map
    Remap {
        /// Source map of the generated bundle
        #[arg(long, value_name = "FILE")]
        map: PathBuf,

        /// Bundle name as it appears in stack frames
        #[arg(long, default_value = "main")]
        bundle: String,

        /// Read the stack from a file instead of stdin
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Fill a template with positional arguments
    Format {
        template: String,
        args: Vec<String>,
    },

    /// Push one message through a configured logger
    Emit {
        /// Message severity
        #[arg(long, default_value = "info")]
        level: Severity,

        message: String,

        /// Config file (defaults to the user config location)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Attach a stack trace read from this file as the message's error
        #[arg(long, value_name = "FILE")]
        stack: Option<PathBuf>,
    },
}

/// Parse arguments, install the diagnostic bridge and run.
///
/// Returns the process exit code.
pub fn process_cli() -> Result<i32> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_deref() {
        Some(raw) => Some(
            diagnostics::parse_level_filter(raw)
                .with_context(|| format!("invalid --log-level '{raw}'"))?,
        ),
        None => None,
    };
    diagnostics::init_log_bridge(level);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli.command, &mut out)
}

/// Run one subcommand, writing results to `out`.
pub fn run(command: Commands, out: &mut dyn Write) -> Result<i32> {
    match command {
        Commands::Remap { map, bundle, input } => {
            let stack = match input {
                Some(path) => read_file(&path)?,
                None => {
                    let mut text = String::new();
                    io::stdin()
                        .read_to_string(&mut text)
                        .context("failed to read stack trace from stdin")?;
                    text
                }
            };
            remap(&map, &bundle, &stack, out)?;
            Ok(0)
        }
        Commands::Format { template, args } => {
            let args: Vec<Arg<'_>> = args.iter().map(Arg::from).collect();
            match format(&template, &args) {
                Ok(text) => {
                    writeln!(out, "{text}")?;
                    Ok(0)
                }
                Err(e) => {
                    writeln!(out, "error: {e}")?;
                    Ok(1)
                }
            }
        }
        Commands::Emit {
            level,
            message,
            config,
            stack,
        } => {
            let config = match config {
                Some(path) => {
                    let mut config = LoggerConfig::load_from(&path)?;
                    config.apply_env_overrides();
                    config
                }
                None => LoggerConfig::load()?,
            };
            let error = stack
                .map(|path| read_file(&path).map(|text| ScriptError::from_stack(&text)))
                .transpose()?;
            emit(&config, level, &message, error.as_ref(), out)?;
            Ok(0)
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Remap `stack` through the source map at `map_path`.
pub fn remap(map_path: &Path, bundle: &str, stack: &str, out: &mut dyn Write) -> Result<()> {
    let map = SourceMap::from_path(map_path)?;
    let mapper = SourceMapStackMapper::new(map, bundle);
    let error = ScriptError::from_stack(stack.trim_end());
    writeln!(out, "{}", mapper.source_mapped_stack_trace(&error))?;
    Ok(())
}

/// Log `message` through a logger built from `config`, copying emitted
/// lines to `out`.
pub fn emit(
    config: &LoggerConfig,
    level: Severity,
    message: &str,
    error: Option<&ScriptError>,
    out: &mut dyn Write,
) -> Result<()> {
    let sink = MemorySink::new();
    let logger = LoggerBuilder::from_config(config)?.sink(sink.clone()).build();
    log::debug!(
        "Emitting at {} ({:?} output, {:?} host, threshold {})",
        level,
        logger.renderer().target(),
        logger.renderer().environment(),
        logger.threshold()
    );
    logger.log(level, message, error, Some(CLI_CALLER));
    for line in sink.take() {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
