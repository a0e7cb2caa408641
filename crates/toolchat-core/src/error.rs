//! Error types shared across toolchat-core.
//!
//! Tool-level failures live in [`crate::tools`] because they never leave a
//! turn; the errors here either abort a turn (`ChatError`) or abort startup
//! (`ConfigError`).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Startup configuration problems. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("chat API URL is not set (config `api_url`, TOOLCHAT_API_URL or VLLM_API_URL)")]
    MissingApiUrl,

    #[error("chat API key is not set (config `api_key` or TOOLCHAT_API_KEY)")]
    MissingApiKey,

    #[error("invalid chat API URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failures of a single chat-completion call.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("response contained no choices")]
    NoChoices,
}

impl ChatError {
    /// Classify a reqwest error, keeping timeouts distinct from other transport failures.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ChatError::Timeout(timeout)
        } else if err.is_decode() {
            ChatError::Decode(err.to_string())
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_mentions_seconds() {
        let err = ChatError::Timeout(Duration::from_secs(120));
        assert_eq!(err.to_string(), "request timed out after 120s");
    }

    #[test]
    fn status_message_includes_body() {
        let err = ChatError::Status {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "API error (503): overloaded");
    }
}
