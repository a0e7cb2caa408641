//! Tool capabilities and the registry the model can call into.
//!
//! - Built-in local tools: current time and current weather
//! - Remote tools discovered from an MCP peer process
//! - [`ToolDispatcher`] turning tool calls into tool-role messages

mod builtin;
mod dispatch;
pub mod mcp;
pub mod weather;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use std::time::Duration;
use thiserror::Error;

pub use builtin::{
    CURRENT_TIME_TOOL_NAME, CURRENT_WEATHER_TOOL_NAME, CurrentTimeTool, CurrentWeatherTool,
    register_local_tools,
};
pub use dispatch::ToolDispatcher;

/// Declared schema of a tool, sent with the first chat call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema object describing the arguments.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Convert this tool definition to API format
    pub fn to_api_format(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }

    /// Argument names declared in the schema.
    pub fn argument_names(&self) -> Vec<String> {
        self.parameters
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Failure raised by a capability while it runs.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("missing required argument '{0}'")]
    MissingArgument(String),

    #[error("{0}")]
    Remote(String),

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Per-call dispatch failure. Rendered into the tool message, never propagated.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Error: Function {name} not found.")]
    UnknownTool { name: String },

    #[error("Error: Invalid JSON arguments for {name}: {raw}")]
    InvalidArguments { name: String, raw: String },

    #[error("Error executing function {name}: {source}")]
    Execution {
        name: String,
        #[source]
        source: InvocationError,
    },
}

/// Something the model can invoke by name.
#[async_trait]
pub trait ToolCapability: Send + Sync {
    fn definition(&self) -> &ToolDefinition;

    /// Run with the parsed arguments as named parameters.
    async fn invoke(&self, args: &Map<String, Value>) -> Result<String, InvocationError>;
}

/// Name-keyed capabilities in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Box<dyn ToolCapability>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability. A later registration replaces an earlier one of the same name.
    pub fn register(&mut self, tool: Box<dyn ToolCapability>) {
        let name = tool.definition().name.clone();
        if self.tools.insert(name.clone(), tool).is_some() {
            log::warn!("tool '{}' registered twice, keeping the latest", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn ToolCapability> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values().map(|t| t.definition())
    }

    /// Tool schema array for the chat request, in registration order.
    pub fn to_api_format(&self) -> Vec<Value> {
        self.definitions().map(ToolDefinition::to_api_format).collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}
