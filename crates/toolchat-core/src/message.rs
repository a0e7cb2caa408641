//! Conversation transcript types.
//!
//! These serialize directly into the OpenAI chat-completion `messages` array.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

/// Role of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Arguments of a tool call, as produced by whichever extraction path found it.
///
/// The structured stream channel yields raw JSON text that is only complete
/// once the stream ends; the text-embedded fallback usually yields an object
/// that has already been parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolArguments {
    Raw(String),
    Parsed(Map<String, Value>),
}

impl ToolArguments {
    /// Parse into a JSON object.
    ///
    /// Empty raw text is treated as `{}` since some backends omit the
    /// arguments of zero-parameter calls entirely.
    pub fn to_object(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match self {
            ToolArguments::Parsed(map) => Ok(map.clone()),
            ToolArguments::Raw(raw) if raw.trim().is_empty() => Ok(Map::new()),
            ToolArguments::Raw(raw) => serde_json::from_str::<Map<String, Value>>(raw),
        }
    }

    /// Render as the JSON string the chat API expects in `function.arguments`.
    pub fn to_json_string(&self) -> String {
        match self {
            ToolArguments::Raw(raw) => raw.clone(),
            ToolArguments::Parsed(map) => Value::Object(map.clone()).to_string(),
        }
    }
}

impl Default for ToolArguments {
    fn default() -> Self {
        ToolArguments::Raw(String::new())
    }
}

/// A single requested tool invocation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: ToolArguments,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: ToolArguments) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

impl Serialize for ToolCallRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        json!({
            "id": self.id,
            "type": "function",
            "function": {
                "name": self.name,
                "arguments": self.arguments.to_json_string(),
            }
        })
        .serialize(serializer)
    }
}

/// Generate a local correlation id for tool calls the model did not label.
pub fn synthesize_call_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("tool_{}", &hex[..8])
}

/// One entry in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationMessage {
    pub role: Role,
    /// Always serialized: assistant messages that only carry tool calls send `null`.
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ConversationMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// Assistant turn that requests tools. Empty content is sent as `null`.
    pub fn assistant_tool_calls(content: String, calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content: (!content.is_empty()).then_some(content),
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_serializes_arguments_as_string() {
        let mut args = Map::new();
        args.insert("location".into(), json!("Beijing"));
        let call = ToolCallRequest::new("call_1", "get_current_weather", ToolArguments::Parsed(args));

        let v = serde_json::to_value(&call).unwrap();
        assert_eq!(v["type"], "function");
        assert_eq!(v["function"]["name"], "get_current_weather");
        assert_eq!(v["function"]["arguments"], r#"{"location":"Beijing"}"#);
    }

    #[test]
    fn assistant_tool_call_message_has_null_content() {
        let msg = ConversationMessage::assistant_tool_calls(
            String::new(),
            vec![ToolCallRequest::new("a", "get_current_time", ToolArguments::default())],
        );
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["role"], "assistant");
        assert!(v["content"].is_null());
        assert_eq!(v["tool_calls"][0]["id"], "a");
        assert!(v.get("tool_call_id").is_none());
    }

    #[test]
    fn tool_result_message_shape() {
        let v = serde_json::to_value(ConversationMessage::tool_result("a", "12:00")).unwrap();
        assert_eq!(v["role"], "tool");
        assert_eq!(v["tool_call_id"], "a");
        assert_eq!(v["content"], "12:00");
        assert!(v.get("tool_calls").is_none());
    }

    #[test]
    fn empty_raw_arguments_parse_as_empty_object() {
        assert!(ToolArguments::Raw("  ".into()).to_object().unwrap().is_empty());
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        assert!(ToolArguments::Raw("[1, 2]".into()).to_object().is_err());
        assert!(ToolArguments::Raw(r#"{"location": "Bei"#.into()).to_object().is_err());
    }

    #[test]
    fn synthesized_ids_are_prefixed_and_unique() {
        let a = synthesize_call_id();
        let b = synthesize_call_id();
        assert!(a.starts_with("tool_"));
        assert_eq!(a.len(), "tool_".len() + 8);
        assert_ne!(a, b);
    }
}
