//! Tool-call dispatch.

use super::{ToolError, ToolRegistry};
use crate::message::{ConversationMessage, ToolCallRequest};

/// Resolves tool calls against a registry and turns every outcome into a
/// tool-role message. Errors never escape: they become the message content
/// so the model can explain them.
#[derive(Debug, Default)]
pub struct ToolDispatcher {
    registry: ToolRegistry,
}

impl ToolDispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Resolve, parse and invoke one call.
    pub async fn invoke(&self, call: &ToolCallRequest) -> Result<String, ToolError> {
        let tool = self
            .registry
            .get(&call.name)
            .ok_or_else(|| ToolError::UnknownTool {
                name: call.name.clone(),
            })?;

        let args = call
            .arguments
            .to_object()
            .map_err(|e| {
                log::warn!("invalid arguments for {}: {}", call.name, e);
                ToolError::InvalidArguments {
                    name: call.name.clone(),
                    raw: call.arguments.to_json_string(),
                }
            })?;

        log::debug!("invoking {} with {}", call.name, serde_json::Value::Object(args.clone()));
        tool.invoke(&args)
            .await
            .map_err(|source| ToolError::Execution {
                name: call.name.clone(),
                source,
            })
    }

    /// Dispatch one call into its correlated tool message.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> ConversationMessage {
        let content = match self.invoke(call).await {
            Ok(result) => result,
            Err(e) => {
                log::debug!("tool call {} failed: {}", call.id, e);
                e.to_string()
            }
        };
        ConversationMessage::tool_result(call.id.clone(), content)
    }
}
