//! API module for toolchat-core.
//!
//! Chat transport, request building and the conversation turn loop,
//! decoupled from presentation through the `ResponseSink` trait.

pub mod client;
pub mod request;
pub mod send;
pub mod sink;

pub use client::{ChatBackend, ChunkStream, HttpChatClient};
pub use request::{ChatSettings, build_request_body};
pub use send::{Conversation, FIRST_CALL_APOLOGY, SECOND_CALL_APOLOGY};
pub use sink::{CollectingSink, ResponseEvent, ResponseSink};
