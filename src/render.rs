//! Line rendering: level gate, decoration and the error-trace branches.
//!
//! Every request ends in exactly one outcome:
//!
//! | emitted? | error? | host       | outcome                     |
//! |----------|--------|------------|-----------------------------|
//! | no       | any    | any        | suppressed (`None`)         |
//! | yes      | no     | any        | [`RenderKind::Plain`]          |
//! | yes      | yes    | simulated  | [`RenderKind::SandboxedError`] |
//! | yes      | yes    | live       | [`RenderKind::MappedError`]    |

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use ticklog_config::{HostEnvironment, RenderTarget, SandboxRenderMode, Severity};

use crate::level;
use crate::stack_mapper::{PassthroughMapper, ScriptError, StackMapper};

/// Shown instead of a remapped trace on a simulated host.
pub const SIMULATOR_NOTICE: &str =
    "Source maps don't work in the simulator - displaying original error";

/// One log call, as seen by the renderer.
#[derive(Debug, Clone, Copy)]
pub struct LogRequest<'a> {
    /// Raw severity value; values outside the known four render with sentinels.
    pub severity: u8,
    pub caller: &'a str,
    pub message: &'a str,
    pub error: Option<&'a ScriptError>,
}

/// Which branch produced a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Plain,
    SandboxedError,
    MappedError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub kind: RenderKind,
    pub text: String,
}

/// Escape HTML special characters for safe embedding in console markup.
pub fn html_escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

fn ansi_code(color: &str) -> u8 {
    match color {
        "red" => 31,
        "green" => 32,
        "yellow" => 33,
        "blue" => 34,
        _ => 37,
    }
}

/// Presentation helpers for a render target.
struct Decor(RenderTarget);

impl Decor {
    fn open(&self, color: &str) -> String {
        match self.0 {
            RenderTarget::Markup => format!("<span style='color:{color}'>"),
            RenderTarget::Ansi => format!("\x1b[{}m", ansi_code(color)),
            RenderTarget::Plain => String::new(),
        }
    }

    fn close(&self) -> &'static str {
        match self.0 {
            RenderTarget::Markup => "</span>",
            RenderTarget::Ansi => "\x1b[0m",
            RenderTarget::Plain => "",
        }
    }

    fn line_break(&self) -> &'static str {
        match self.0 {
            RenderTarget::Markup => "<br>",
            RenderTarget::Ansi | RenderTarget::Plain => "\n",
        }
    }

    fn escape<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match self.0 {
            RenderTarget::Markup => Cow::Owned(html_escape(text)),
            RenderTarget::Ansi | RenderTarget::Plain => Cow::Borrowed(text),
        }
    }
}

/// Produces decorated lines, or nothing for suppressed requests.
#[derive(Clone)]
pub struct Renderer {
    target: RenderTarget,
    environment: HostEnvironment,
    sandbox_mode: SandboxRenderMode,
    mapper: Arc<dyn StackMapper>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Arc::new(PassthroughMapper))
    }
}

impl Renderer {
    pub fn new(mapper: Arc<dyn StackMapper>) -> Self {
        Self {
            target: RenderTarget::default(),
            environment: HostEnvironment::default(),
            sandbox_mode: SandboxRenderMode::default(),
            mapper,
        }
    }

    pub fn with_target(mut self, target: RenderTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_environment(mut self, environment: HostEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_sandbox_mode(mut self, mode: SandboxRenderMode) -> Self {
        self.sandbox_mode = mode;
        self
    }

    pub fn with_mapper(mut self, mapper: Arc<dyn StackMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn target(&self) -> RenderTarget {
        self.target
    }

    pub fn environment(&self) -> HostEnvironment {
        self.environment
    }

    /// Render `request` under `threshold`; `None` means suppressed.
    pub fn render(&self, request: &LogRequest<'_>, threshold: Severity) -> Option<RenderedLine> {
        if !level::should_emit(request.severity, threshold) {
            return None;
        }

        let decor = Decor(self.target);
        let color = level::color_hint(request.severity);
        let label = level::label(request.severity);
        let open = decor.open(color);
        let close = decor.close();
        let br = decor.line_break();

        let Some(error) = request.error else {
            return Some(RenderedLine {
                kind: RenderKind::Plain,
                text: format!(
                    "{open} {label} [{}] :{}{close}",
                    request.caller, request.message
                ),
            });
        };

        if self.environment.is_simulated() {
            // The mapper is unreliable on a simulated host, show the raw stack.
            let raw = error.stack_or_header();
            let stack = decor.escape(&raw);
            let text = match self.sandbox_mode {
                SandboxRenderMode::NoticeOnly => {
                    format!("{open}{SIMULATOR_NOTICE}{br}{stack}{close}")
                }
                SandboxRenderMode::WithContext => format!(
                    "{open} {label} [{}] : {}{br}{SIMULATOR_NOTICE}{br}{stack}{close}",
                    request.caller, request.message
                ),
            };
            return Some(RenderedLine {
                kind: RenderKind::SandboxedError,
                text,
            });
        }

        let mapped = self.mapper.source_mapped_stack_trace(error);
        let stack = decor.escape(&mapped);
        Some(RenderedLine {
            kind: RenderKind::MappedError,
            text: format!(
                "{open} {label} [{}] : {}{br}{stack}{close}",
                request.caller, request.message
            ),
        })
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("target", &self.target)
            .field("environment", &self.environment)
            .field("sandbox_mode", &self.sandbox_mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mapper that tags its output and records nothing else.
    struct TaggingMapper;

    impl StackMapper for TaggingMapper {
        fn source_mapped_stack_trace(&self, error: &ScriptError) -> String {
            format!("mapped<{}>", error.name())
        }
    }

    fn request<'a>(severity: Severity, error: Option<&'a ScriptError>) -> LogRequest<'a> {
        LogRequest {
            severity: severity.value(),
            caller: "src/loop.rs:10:5",
            message: "hello",
            error,
        }
    }

    fn renderer() -> Renderer {
        Renderer::new(Arc::new(TaggingMapper))
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
        assert_eq!(html_escape("\"it's\""), "&quot;it&#39;s&quot;");
    }

    #[test]
    fn test_suppressed_below_threshold() {
        let r = renderer();
        assert!(r.render(&request(Severity::Debug, None), Severity::Info).is_none());
        let err = ScriptError::new("Error", "x");
        assert!(r.render(&request(Severity::Info, Some(&err)), Severity::Warn).is_none());
    }

    #[test]
    fn test_plain_markup_line() {
        let line = renderer()
            .render(&request(Severity::Info, None), Severity::Info)
            .unwrap();
        assert_eq!(line.kind, RenderKind::Plain);
        assert_eq!(
            line.text,
            "<span style='color:blue'> INFO [src/loop.rs:10:5] :hello</span>"
        );
    }

    #[test]
    fn test_mapped_error_line() {
        let err = ScriptError::new("TypeError", "bad").with_stack("TypeError: bad\n    at main:1:1");
        let line = renderer()
            .render(&request(Severity::Error, Some(&err)), Severity::Info)
            .unwrap();
        assert_eq!(line.kind, RenderKind::MappedError);
        assert_eq!(
            line.text,
            "<span style='color:red'> ERRO [src/loop.rs:10:5] : hello<br>mapped&lt;TypeError&gt;</span>"
        );
    }

    #[test]
    fn test_sandboxed_notice_only_drops_message_and_caller() {
        let err = ScriptError::new("Error", "boom").with_stack("Error: boom\n    at <main>:1:1");
        let line = renderer()
            .with_environment(HostEnvironment::Simulated)
            .render(&request(Severity::Warn, Some(&err)), Severity::Debug)
            .unwrap();
        assert_eq!(line.kind, RenderKind::SandboxedError);
        assert_eq!(
            line.text,
            format!(
                "<span style='color:yellow'>{SIMULATOR_NOTICE}<br>Error: boom\n    at &lt;main&gt;:1:1</span>"
            )
        );
        assert!(!line.text.contains("hello"));
        assert!(!line.text.contains("src/loop.rs"));
        assert!(!line.text.contains("mapped"));
    }

    #[test]
    fn test_sandboxed_with_context_keeps_message() {
        let err = ScriptError::new("Error", "boom");
        let line = renderer()
            .with_environment(HostEnvironment::Simulated)
            .with_sandbox_mode(SandboxRenderMode::WithContext)
            .with_target(RenderTarget::Plain)
            .render(&request(Severity::Error, Some(&err)), Severity::Info)
            .unwrap();
        assert_eq!(line.kind, RenderKind::SandboxedError);
        assert_eq!(
            line.text,
            format!(" ERRO [src/loop.rs:10:5] : hello\n{SIMULATOR_NOTICE}\nError: boom")
        );
    }

    #[test]
    fn test_ansi_target() {
        let line = renderer()
            .with_target(RenderTarget::Ansi)
            .render(&request(Severity::Debug, None), Severity::Debug)
            .unwrap();
        assert_eq!(line.text, "\x1b[32m DBUG [src/loop.rs:10:5] :hello\x1b[0m");
    }

    #[test]
    fn test_plain_target_does_not_escape() {
        let err = ScriptError::new("E", "").with_stack("<raw>");
        let line = Renderer::default()
            .with_target(RenderTarget::Plain)
            .render(&request(Severity::Error, Some(&err)), Severity::Error)
            .unwrap();
        assert_eq!(line.text, " ERRO [src/loop.rs:10:5] : hello\n<raw>");
    }

    #[test]
    fn test_unknown_severity_value_is_never_emitted() {
        let r = renderer();
        let req = LogRequest {
            severity: 7,
            caller: "c",
            message: "m",
            error: None,
        };
        assert!(r.render(&req, Severity::Debug).is_none());
        assert_eq!(level::label(req.severity), "????");
    }

    #[test]
    fn test_outcomes_are_exhaustive_and_exclusive() {
        let err = ScriptError::new("Error", "x");
        for env in [HostEnvironment::Live, HostEnvironment::Simulated] {
            let r = renderer().with_environment(env);
            for severity in Severity::all() {
                for threshold in Severity::all() {
                    for error in [None, Some(&err)] {
                        let out = r.render(&request(*severity, error), *threshold);
                        let expected = if severity > threshold {
                            None
                        } else if error.is_none() {
                            Some(RenderKind::Plain)
                        } else if env.is_simulated() {
                            Some(RenderKind::SandboxedError)
                        } else {
                            Some(RenderKind::MappedError)
                        };
                        assert_eq!(out.map(|l| l.kind), expected);
                    }
                }
            }
        }
    }
}
