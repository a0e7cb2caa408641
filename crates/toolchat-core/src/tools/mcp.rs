//! Remote tools served by an MCP peer process over stdio.
//!
//! The peer script is launched with `python` (for `.py`) or `node`, the
//! tool list is read once at connect time, and every remote tool becomes a
//! [`ToolCapability`] that forwards calls with a bounded wait.

use super::{InvocationError, ToolCapability, ToolDefinition, ToolRegistry};
use async_trait::async_trait;
use rmcp::model::{CallToolRequestParams, Content, ListToolsResult};
use rmcp::service::RunningService;
use rmcp::transport::{IntoTransport, TokioChildProcess};
use rmcp::{RoleClient, ServiceExt};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const EMPTY_CONTENT: &str = "Tool returned no content.";

#[derive(Debug, Error)]
pub enum McpError {
    #[error("server script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    #[error("failed to launch server script: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("MCP handshake failed: {0}")]
    Handshake(String),

    #[error("failed to list tools: {0}")]
    ListTools(String),

    #[error("MCP server did not respond within {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Interpreter used to run a peer script.
pub fn interpreter_for(script: &Path) -> &'static str {
    match script.extension().and_then(|e| e.to_str()) {
        Some("py") => "python",
        _ => "node",
    }
}

/// A connected MCP server with its discovered tools.
pub struct McpPeer {
    service: RunningService<RoleClient, ()>,
    tools: Vec<rmcp::model::Tool>,
}

impl McpPeer {
    /// Spawn the script, complete the handshake and discover its tools.
    ///
    /// `timeout` bounds the handshake and the tool listing separately.
    pub async fn connect(script: &Path, timeout: Duration) -> Result<Self, McpError> {
        if !script.is_file() {
            return Err(McpError::ScriptNotFound(script.to_path_buf()));
        }

        let mut cmd = tokio::process::Command::new(interpreter_for(script));
        cmd.arg(script);

        let transport = TokioChildProcess::new(cmd).map_err(McpError::Spawn)?;
        let peer = Self::connect_with(transport, timeout).await?;
        log::info!("connected to {}: {} tools", script.display(), peer.tools.len());
        Ok(peer)
    }

    /// Handshake and tool discovery over an already established transport.
    pub async fn connect_with<T, E, A>(transport: T, timeout: Duration) -> Result<Self, McpError>
    where
        T: IntoTransport<RoleClient, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let service = tokio::time::timeout(timeout, ().serve(transport))
            .await
            .map_err(|_| McpError::Timeout(timeout))?
            .map_err(|e| McpError::Handshake(e.to_string()))?;

        let ListToolsResult { tools, .. } =
            tokio::time::timeout(timeout, service.list_tools(Default::default()))
                .await
                .map_err(|_| McpError::Timeout(timeout))?
                .map_err(|e| McpError::ListTools(e.to_string()))?;

        Ok(Self { service, tools })
    }

    /// Definitions of every discovered tool, in server order.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name.to_string(),
                description: tool.description.as_deref().unwrap_or("").to_string(),
                parameters: serde_json::to_value(&*tool.input_schema)
                    .unwrap_or(Value::Object(Default::default())),
            })
            .collect()
    }

    /// Call a tool, returning its text payload.
    pub async fn call(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<String, InvocationError> {
        let result = self
            .service
            .call_tool(CallToolRequestParams {
                name: name.to_string().into(),
                arguments: Some(arguments.clone()),
                meta: None,
                task: None,
            })
            .await
            .map_err(|e| InvocationError::Remote(e.to_string()))?;

        let text = extract_text(&result.content);
        if result.is_error == Some(true) {
            return Err(InvocationError::Remote(text));
        }
        Ok(text)
    }
}

/// Join the text blocks of a tool result; no text at all becomes a fixed notice.
fn extract_text(content: &[Content]) -> String {
    let text = content
        .iter()
        .filter_map(|c| c.raw.as_text().map(|t| t.text.as_str()))
        .collect::<Vec<_>>()
        .join("\n");
    if text.trim().is_empty() {
        EMPTY_CONTENT.to_string()
    } else {
        text
    }
}

/// One remote tool exposed as a local capability.
pub struct McpTool {
    definition: ToolDefinition,
    peer: Arc<McpPeer>,
    timeout: Duration,
}

#[async_trait]
impl ToolCapability for McpTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn invoke(&self, args: &Map<String, Value>) -> Result<String, InvocationError> {
        tokio::time::timeout(self.timeout, self.peer.call(&self.definition.name, args))
            .await
            .map_err(|_| InvocationError::Timeout(self.timeout))?
    }
}

/// Register every tool the peer offers. Returns how many were added.
pub fn register_remote_tools(
    peer: Arc<McpPeer>,
    registry: &mut ToolRegistry,
    call_timeout: Duration,
) -> usize {
    let definitions = peer.tool_definitions();
    let count = definitions.len();
    for definition in definitions {
        registry.register(Box::new(McpTool {
            definition,
            peer: Arc::clone(&peer),
            timeout: call_timeout,
        }));
    }
    count
}
