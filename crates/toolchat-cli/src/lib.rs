//! toolchat-cli: terminal front ends for toolchat-core.
//!
//! Two binaries share this library: `toolchat` (local time and weather
//! tools, one question) and `toolchat-mcp` (tools from an MCP server script,
//! interactive loop).

pub mod cli;
pub mod session;
pub mod sink;
