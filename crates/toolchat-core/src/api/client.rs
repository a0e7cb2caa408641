//! Chat-completion transport.

use crate::config::ResolvedConfig;
use crate::error::ChatError;
use crate::llm::{CompletionResponse, StreamChunk};
use async_trait::async_trait;
use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::future;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use serde_json::Value;
use std::time::Duration;

const DONE_MARKER: &str = "[DONE]";

/// Lazy sequence of decoded response fragments.
pub type ChunkStream = BoxStream<'static, Result<StreamChunk, ChatError>>;

/// Something that can answer a chat-completion request body.
///
/// Streaming and non-streaming calls both come back as a [`ChunkStream`]; a
/// non-streaming response is a single fragment.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, body: &Value) -> Result<ChunkStream, ChatError>;
}

/// OpenAI-compatible HTTP backend.
#[derive(Debug, Clone)]
pub struct HttpChatClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpChatClient {
    pub fn new(config: &ResolvedConfig) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.request_timeout,
        })
    }
}

#[async_trait]
impl ChatBackend for HttpChatClient {
    async fn send(&self, body: &Value) -> Result<ChunkStream, ChatError> {
        let streaming = body.get("stream").and_then(Value::as_bool).unwrap_or(false);
        log::debug!("POST {} (stream={})", self.url, streaming);
        log::trace!("request body: {}", body);

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ChatError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if streaming {
            return Ok(sse_chunks(response.bytes_stream().boxed(), self.timeout));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::from_reqwest(e, self.timeout))?;
        Ok(stream::once(async move { Ok(parsed.into_chunk()) }).boxed())
    }
}

/// Decode an SSE byte stream into typed fragments.
///
/// Malformed `data:` payloads are logged and skipped; the stream ends at body
/// end or at `[DONE]`, whichever comes first.
fn sse_chunks<S, B>(body: S, timeout: Duration) -> ChunkStream
where
    S: Stream<Item = reqwest::Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    body.eventsource()
        .take_while(|event| {
            future::ready(!matches!(event, Ok(e) if e.data.trim() == DONE_MARKER))
        })
        .filter_map(move |event| {
            let item = match event {
                Ok(event) => parse_fragment(&event.data).map(Ok),
                Err(EventStreamError::Transport(e)) => Some(Err(ChatError::from_reqwest(e, timeout))),
                Err(e) => {
                    log::warn!("ignoring undecodable stream event: {}", e);
                    None
                }
            };
            future::ready(item)
        })
        .boxed()
}

fn parse_fragment(data: &str) -> Option<StreamChunk> {
    if data.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            log::warn!("ignoring malformed stream fragment: {}", e);
            log::debug!("fragment was: {}", data);
            None
        }
    }
}
