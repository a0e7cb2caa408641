//! Response sink abstraction for decoupling the turn loop from presentation.
//!
//! The orchestrator emits [`ResponseEvent`]s as a turn progresses; the CLI
//! decides how (and whether) to show them.

use std::io;

/// Events emitted while a turn is processed.
#[derive(Debug, Clone)]
pub enum ResponseEvent<'a> {
    /// A chunk of assistant text from the model.
    TextChunk(&'a str),

    /// A chunk of reasoning text from a reasoning model.
    Reasoning(&'a str),

    /// A diagnostic message.
    Diagnostic {
        message: String,
        /// If true, only show when verbose mode is enabled.
        verbose_only: bool,
    },

    /// A tool is about to be invoked.
    ToolStart { name: String },

    /// A tool invocation produced its result text (possibly an error text).
    ToolResult { name: String, result: String },

    /// A new model call is starting.
    StartResponse,

    /// The turn has finished.
    Finished,
}

/// Trait for handling response events during a turn.
///
/// # Example
///
/// ```
/// use toolchat_core::api::sink::{ResponseSink, ResponseEvent};
/// use std::io;
///
/// struct MySink {
///     text: String,
/// }
///
/// impl ResponseSink for MySink {
///     fn handle(&mut self, event: ResponseEvent<'_>) -> io::Result<()> {
///         if let ResponseEvent::TextChunk(chunk) = event {
///             self.text.push_str(chunk);
///         }
///         Ok(())
///     }
/// }
///
/// let mut sink = MySink { text: String::new() };
/// sink.handle(ResponseEvent::TextChunk("Hello")).unwrap();
/// assert_eq!(sink.text, "Hello");
/// ```
pub trait ResponseSink {
    fn handle(&mut self, event: ResponseEvent<'_>) -> io::Result<()>;
}

/// A sink that collects events for programmatic use and tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub text: String,
    pub reasoning: String,
    pub diagnostics: Vec<String>,
    /// `(name, result)` for every tool invocation, in order.
    pub tool_results: Vec<(String, String)>,
    /// Number of model calls started.
    pub responses: usize,
    pub finished: bool,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseSink for CollectingSink {
    fn handle(&mut self, event: ResponseEvent<'_>) -> io::Result<()> {
        match event {
            ResponseEvent::TextChunk(chunk) => self.text.push_str(chunk),
            ResponseEvent::Reasoning(chunk) => self.reasoning.push_str(chunk),
            ResponseEvent::Diagnostic { message, .. } => self.diagnostics.push(message),
            ResponseEvent::ToolResult { name, result } => self.tool_results.push((name, result)),
            ResponseEvent::StartResponse => self.responses += 1,
            ResponseEvent::Finished => self.finished = true,
            ResponseEvent::ToolStart { .. } => {}
        }
        Ok(())
    }
}
