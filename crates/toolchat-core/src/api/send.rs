//! The conversation turn loop.
//!
//! One turn is at most two chat calls: the first with the tool schema, and,
//! if the model asked for tools, a second one over the tool results without
//! the schema. The transcript is only updated when a turn completes.

use super::client::ChatBackend;
use super::request::{ChatSettings, build_request_body};
use super::sink::{ResponseEvent, ResponseSink};
use crate::config::ResolvedConfig;
use crate::error::ChatError;
use crate::extract::{CallSource, extract_tool_calls};
use crate::llm::{AccumulatedResponse, ChunkAccumulator};
use crate::message::ConversationMessage;
use crate::prompts::default_system_prompt;
use crate::tools::ToolDispatcher;
use futures_util::StreamExt;
use serde_json::Value;
use std::io;

/// Returned when the first chat call of a turn fails.
pub const FIRST_CALL_APOLOGY: &str = "Sorry, I ran into trouble while thinking.";

/// Returned when the follow-up call over tool results fails.
pub const SECOND_CALL_APOLOGY: &str =
    "Sorry, I fetched the information but ran into trouble summarising it.";

/// Owns the transcript and drives turns against a chat backend.
pub struct Conversation<B: ChatBackend> {
    backend: B,
    dispatcher: ToolDispatcher,
    settings: ChatSettings,
    system_prompt: String,
    transcript: Vec<ConversationMessage>,
}

impl<B: ChatBackend> Conversation<B> {
    pub fn new(backend: B, dispatcher: ToolDispatcher, config: &ResolvedConfig) -> Self {
        let system_prompt = config
            .system_prompt
            .clone()
            .unwrap_or_else(|| default_system_prompt(dispatcher.registry()));
        Self {
            backend,
            dispatcher,
            settings: ChatSettings::from(config),
            system_prompt,
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[ConversationMessage] {
        &self.transcript
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Run one user turn to completion and return the answer text.
    ///
    /// Chat failures do not surface as errors: the turn ends with an apology
    /// and the transcript is left as it was. Only sink I/O errors propagate.
    pub async fn send<S: ResponseSink>(&mut self, input: &str, sink: &mut S) -> io::Result<String> {
        let mut staged = self.transcript.clone();
        if staged.is_empty() {
            staged.push(ConversationMessage::system(self.system_prompt.clone()));
        }
        staged.push(ConversationMessage::user(input));

        let tools = self.dispatcher.registry().to_api_format();
        let first = match self.call(&staged, Some(&tools), sink).await? {
            Ok(response) => response,
            Err(e) => return self.abort(e, FIRST_CALL_APOLOGY, sink),
        };

        let extraction = extract_tool_calls(first);
        if !extraction.has_tool_calls() {
            staged.push(ConversationMessage::assistant(extraction.content.clone()));
            return self.commit(staged, extraction.content, sink);
        }

        sink.handle(ResponseEvent::Diagnostic {
            message: format!(
                "model requested {} tool call(s){}",
                extraction.tool_calls.len(),
                match extraction.source {
                    Some(CallSource::Embedded) => " embedded in its reply",
                    _ => "",
                }
            ),
            verbose_only: true,
        })?;

        staged.push(ConversationMessage::assistant_tool_calls(
            extraction.content,
            extraction.tool_calls.clone(),
        ));

        for call in &extraction.tool_calls {
            sink.handle(ResponseEvent::ToolStart {
                name: call.name.clone(),
            })?;
            let message = self.dispatcher.dispatch(call).await;
            sink.handle(ResponseEvent::ToolResult {
                name: call.name.clone(),
                result: message.content.clone().unwrap_or_default(),
            })?;
            staged.push(message);
        }

        let second = match self.call(&staged, None, sink).await? {
            Ok(response) => response,
            Err(e) => return self.abort(e, SECOND_CALL_APOLOGY, sink),
        };
        if !second.tool_calls.is_empty() {
            log::warn!(
                "ignoring {} tool call(s) in the follow-up response",
                second.tool_calls.len()
            );
        }

        staged.push(ConversationMessage::assistant(second.content.clone()));
        self.commit(staged, second.content, sink)
    }

    // The outer Result carries sink failures; the inner one the chat call outcome.
    async fn call<S: ResponseSink>(
        &self,
        messages: &[ConversationMessage],
        tools: Option<&[Value]>,
        sink: &mut S,
    ) -> io::Result<Result<AccumulatedResponse, ChatError>> {
        sink.handle(ResponseEvent::StartResponse)?;
        let body = build_request_body(&self.settings, messages, tools);

        let mut stream = match self.backend.send(&body).await {
            Ok(stream) => stream,
            Err(e) => return Ok(Err(e)),
        };

        let mut acc = ChunkAccumulator::new();
        while let Some(item) = stream.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => return Ok(Err(e)),
            };
            let progress = acc.push(&chunk);
            if let Some(reasoning) = progress.reasoning {
                sink.handle(ResponseEvent::Reasoning(reasoning))?;
            }
            if let Some(text) = progress.content {
                sink.handle(ResponseEvent::TextChunk(text))?;
            }
        }

        if !acc.saw_choice() {
            return Ok(Err(ChatError::NoChoices));
        }
        Ok(Ok(acc.finish()))
    }

    fn commit<S: ResponseSink>(
        &mut self,
        staged: Vec<ConversationMessage>,
        answer: String,
        sink: &mut S,
    ) -> io::Result<String> {
        self.transcript = staged;
        sink.handle(ResponseEvent::Finished)?;
        Ok(answer)
    }

    fn abort<S: ResponseSink>(
        &self,
        err: ChatError,
        apology: &str,
        sink: &mut S,
    ) -> io::Result<String> {
        log::warn!("chat call failed: {}", err);
        sink.handle(ResponseEvent::Diagnostic {
            message: format!("chat call failed: {err}"),
            verbose_only: false,
        })?;
        sink.handle(ResponseEvent::Finished)?;
        Ok(apology.to_string())
    }
}
