//! LLM wire types and streaming response accumulation.
//!
//! Fragments arrive as server-sent `data:` payloads (decoded in
//! [`crate::api::client`]); [`ChunkAccumulator`] folds the resulting
//! [`StreamChunk`]s into a final `(content, tool_calls)` pair.

use crate::message::{ToolArguments, ToolCallRequest};
use serde::Deserialize;
use serde_json::Value;

/// Maximum number of simultaneous tool calls allowed (prevents memory exhaustion from malicious responses)
pub const MAX_TOOL_CALLS: usize = 100;

// ============================================================================
// Streaming fragment types
// ============================================================================

/// One streamed `chat.completion.chunk`. Heartbeat fragments carry no choices.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub choices: Option<Vec<ChunkChoice>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Option<ChunkDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
    /// Emitted by reasoning models (QwQ, DeepSeek-R1 on vLLM).
    #[serde(default)]
    pub reasoning_content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolCallDelta {
    /// Some servers send `null` for a lone call; treated as 0.
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

impl StreamChunk {
    /// A fragment carrying only a content delta.
    pub fn content(text: impl Into<String>) -> Self {
        Self::from_delta(ChunkDelta {
            content: Some(text.into()),
            ..Default::default()
        })
    }

    /// A fragment carrying a single partial tool call.
    pub fn tool_call(
        index: usize,
        id: Option<&str>,
        name: Option<&str>,
        arguments: Option<&str>,
    ) -> Self {
        Self::from_delta(ChunkDelta {
            tool_calls: Some(vec![ToolCallDelta {
                index: Some(index),
                id: id.map(str::to_string),
                function: Some(FunctionDelta {
                    name: name.map(str::to_string),
                    arguments: arguments.map(str::to_string),
                }),
            }]),
            ..Default::default()
        })
    }

    fn from_delta(delta: ChunkDelta) -> Self {
        Self {
            choices: Some(vec![ChunkChoice { delta: Some(delta) }]),
        }
    }

    /// The delta of the first choice, if any. Only the first choice is used.
    pub fn first_delta(&self) -> Option<&ChunkDelta> {
        self.choices.as_ref()?.first()?.delta.as_ref()
    }

    fn has_choices(&self) -> bool {
        self.choices.as_ref().is_some_and(|c| !c.is_empty())
    }
}

// ============================================================================
// Non-streaming response types
// ============================================================================

/// A non-streaming `chat.completion` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Option<Vec<CompletionChoice>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub message: Option<CompletionMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<CompletionToolCall>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionToolCall {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<CompletionFunction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionFunction {
    #[serde(default)]
    pub name: Option<String>,
    /// Usually a JSON string; some servers send the object itself.
    #[serde(default)]
    pub arguments: Option<Value>,
}

impl CompletionResponse {
    /// Re-express a complete response as one stream fragment so both modes
    /// share the same accumulation path.
    pub fn into_chunk(self) -> StreamChunk {
        let Some(choice) = self.choices.and_then(|c| c.into_iter().next()) else {
            return StreamChunk::default();
        };
        let message = choice.message.unwrap_or_default();
        let tool_calls = message.tool_calls.map(|calls| {
            calls
                .into_iter()
                .enumerate()
                .map(|(index, call)| {
                    let function = call.function.unwrap_or_default();
                    ToolCallDelta {
                        index: Some(index),
                        id: call.id,
                        function: Some(FunctionDelta {
                            name: function.name,
                            arguments: function.arguments.map(|v| match v {
                                Value::String(s) => s,
                                other => other.to_string(),
                            }),
                        }),
                    }
                })
                .collect()
        });
        StreamChunk::from_delta(ChunkDelta {
            content: message.content,
            reasoning_content: message.reasoning_content,
            tool_calls,
        })
    }
}

// ============================================================================
// Accumulation
// ============================================================================

/// Accumulated tool call data during streaming
#[derive(Debug, Default, Clone)]
pub struct ToolCallAccumulator {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// Text deltas carried by one fragment, for progress output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress<'a> {
    pub content: Option<&'a str>,
    pub reasoning: Option<&'a str>,
}

/// Finalized result of one model call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccumulatedResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

/// Folds stream fragments into content and index-keyed tool calls.
///
/// Content and tool-call names/arguments are appended in arrival order; a
/// tool call's id is taken from its first non-empty fragment and never
/// concatenated.
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    content: String,
    tool_calls: Vec<ToolCallAccumulator>,
    saw_choice: bool,
}

impl ChunkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one fragment in, returning its text deltas.
    pub fn push<'c>(&mut self, chunk: &'c StreamChunk) -> ChunkProgress<'c> {
        if !chunk.has_choices() {
            return ChunkProgress::default();
        }
        self.saw_choice = true;

        let Some(delta) = chunk.first_delta() else {
            return ChunkProgress::default();
        };

        let content = delta.content.as_deref().filter(|c| !c.is_empty());
        if let Some(text) = content {
            self.content.push_str(text);
        }

        if let Some(deltas) = &delta.tool_calls {
            for tc in deltas {
                self.push_tool_call(tc);
            }
        }

        ChunkProgress {
            content,
            reasoning: delta.reasoning_content.as_deref().filter(|r| !r.is_empty()),
        }
    }

    fn push_tool_call(&mut self, tc: &ToolCallDelta) {
        let index = tc.index.unwrap_or(0);
        if index >= MAX_TOOL_CALLS {
            log::warn!(
                "tool call index {} exceeds limit {}, skipping",
                index,
                MAX_TOOL_CALLS
            );
            return;
        }

        while self.tool_calls.len() <= index {
            self.tool_calls.push(ToolCallAccumulator::default());
        }
        let slot = &mut self.tool_calls[index];

        if slot.id.is_empty()
            && let Some(id) = tc.id.as_deref()
        {
            slot.id = id.to_string();
        }
        if let Some(func) = &tc.function {
            if let Some(name) = func.name.as_deref() {
                slot.name.push_str(name);
            }
            if let Some(args) = func.arguments.as_deref() {
                slot.arguments.push_str(args);
            }
        }
    }

    /// Whether any fragment carried at least one choice.
    pub fn saw_choice(&self) -> bool {
        self.saw_choice
    }

    /// Finalize into tool calls ordered by index.
    pub fn finish(self) -> AccumulatedResponse {
        AccumulatedResponse {
            content: self.content,
            tool_calls: self
                .tool_calls
                .into_iter()
                .map(|tc| ToolCallRequest::new(tc.id, tc.name, ToolArguments::Raw(tc.arguments)))
                .collect(),
        }
    }
}
