//! Deciding which tool calls, if any, a finished model response asks for.
//!
//! The structured `tool_calls` channel always wins. Only when it is empty is
//! the assistant text scanned for an embedded JSON call, for backends that
//! answer with `{"name": ..., "arguments": ...}` as plain prose.

use crate::llm::AccumulatedResponse;
use crate::message::{ToolArguments, ToolCallRequest, synthesize_call_id};
use serde_json::{Map, Value};

/// Where the extracted calls came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallSource {
    Structured,
    Embedded,
}

/// Outcome of extraction over one finalized response.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Assistant text; cleared when it was itself an embedded call.
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub source: Option<CallSource>,
}

impl Extraction {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Apply the structured-then-embedded precedence to an accumulated response.
pub fn extract_tool_calls(response: AccumulatedResponse) -> Extraction {
    let AccumulatedResponse {
        content,
        tool_calls,
    } = response;

    // Indices that never received a name are gaps, not calls.
    let structured: Vec<ToolCallRequest> = tool_calls
        .into_iter()
        .filter(|tc| !tc.name.trim().is_empty())
        .map(|mut tc| {
            if tc.id.is_empty() {
                tc.id = synthesize_call_id();
                log::debug!("synthesized id {} for {}", tc.id, tc.name);
            }
            tc
        })
        .collect();

    if !structured.is_empty() {
        return Extraction {
            content,
            tool_calls: structured,
            source: Some(CallSource::Structured),
        };
    }

    if let Some(call) = parse_embedded_call(&content) {
        log::debug!("recovered embedded tool call {} from text", call.name);
        return Extraction {
            content: String::new(),
            tool_calls: vec![call],
            source: Some(CallSource::Embedded),
        };
    }

    Extraction {
        content,
        tool_calls: Vec::new(),
        source: None,
    }
}

/// Look for a single JSON tool call embedded in assistant text.
///
/// Accepts `{"name", "arguments"}` or `{"tool_name", "tool_arguments"}`,
/// optionally wrapped in a code fence or `<tool_call>` markers. Anything
/// else, including malformed JSON, is not a tool call.
pub fn parse_embedded_call(content: &str) -> Option<ToolCallRequest> {
    let cleaned = strip_wrappers(content);
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }

    let value: Value = match serde_json::from_str(&cleaned[start..=end]) {
        Ok(v) => v,
        Err(e) => {
            log::debug!("text is not an embedded tool call: {}", e);
            return None;
        }
    };
    let obj = value.as_object()?;

    let (name, arguments) = match (obj.get("name"), obj.get("arguments")) {
        (Some(name), Some(args)) => (name, args),
        _ => (obj.get("tool_name")?, obj.get("tool_arguments")?),
    };
    let name = name.as_str().map(str::trim).filter(|n| !n.is_empty())?;

    let arguments = match arguments {
        Value::Object(map) => ToolArguments::Parsed(map.clone()),
        Value::String(raw) => ToolArguments::Raw(raw.clone()),
        Value::Null => ToolArguments::Parsed(Map::new()),
        other => ToolArguments::Raw(other.to_string()),
    };

    Some(ToolCallRequest::new(synthesize_call_id(), name, arguments))
}

fn strip_wrappers(content: &str) -> String {
    let mut text = content.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string (`json`, `tool_call`, ...) up to the first newline.
        text = rest.split_once('\n').map_or(rest, |(_, body)| body);
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.replace("<tool_call>", "")
        .replace("</tool_call>", "")
        .trim()
        .to_string()
}
