//! toolchat-core: tool-calling chat against OpenAI-compatible endpoints
//!
//! Provides stream accumulation, tool-call extraction, tool dispatch and the
//! two-call conversation loop used by the toolchat binaries.
//!
//! # Quick Start
//!
//! ```no_run
//! // Requires TOOLCHAT_API_URL and TOOLCHAT_API_KEY (or ~/.toolchat/config.toml).
//! use toolchat_core::{CollectingSink, Config, Conversation, HttpChatClient, ToolDispatcher, ToolRegistry};
//! use toolchat_core::tools::register_local_tools;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?.resolve()?;
//!     let mut registry = ToolRegistry::new();
//!     register_local_tools(&mut registry, &config.weather)?;
//!
//!     let client = HttpChatClient::new(&config)?;
//!     let mut conversation = Conversation::new(client, ToolDispatcher::new(registry), &config);
//!     let mut sink = CollectingSink::new();
//!
//!     let answer = conversation.send("北京天气如何？", &mut sink).await?;
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod message;
pub mod prompts;
pub mod tools;

// Re-export commonly used types
pub use api::{
    ChatBackend, CollectingSink, Conversation, HttpChatClient, ResponseEvent, ResponseSink,
};
pub use config::{Config, ResolvedConfig};
pub use error::{ChatError, ConfigError};
pub use message::{ConversationMessage, Role, ToolArguments, ToolCallRequest};
pub use tools::{ToolCapability, ToolDefinition, ToolDispatcher, ToolRegistry};
