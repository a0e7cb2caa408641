//! API request building utilities.
//!
//! This module handles constructing the request body for chat-completion
//! calls, applying the configured sampling parameters.

use crate::config::ResolvedConfig;
use crate::message::ConversationMessage;
use serde_json::{Value, json};

/// Per-call settings derived from [`ResolvedConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    pub model: String,
    pub stream: bool,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl From<&ResolvedConfig> for ChatSettings {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            model: config.model.clone(),
            stream: config.stream,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Build the request body for a chat-completion call.
///
/// `tools` is sent together with `tool_choice: "auto"` only when non-empty.
pub fn build_request_body(
    settings: &ChatSettings,
    messages: &[ConversationMessage],
    tools: Option<&[Value]>,
) -> Value {
    let mut body = json!({
        "model": settings.model,
        "messages": messages,
        "stream": settings.stream,
    });

    if let Some(tools) = tools
        && !tools.is_empty()
    {
        body["tools"] = json!(tools);
        body["tool_choice"] = json!("auto");
    }

    if let Some(temp) = settings.temperature {
        body["temperature"] = json!(temp);
    }

    if let Some(max_tokens) = settings.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }

    body
}
