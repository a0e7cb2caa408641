//! Startup shared by both binaries: logging, configuration and wiring.

use crate::cli::CommonArgs;
use toolchat_core::{
    ChatError, Config, ConfigError, Conversation, HttpChatClient, ResolvedConfig, ToolDispatcher,
    ToolRegistry,
};

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,toolchat_core=debug,toolchat_cli=debug"
    } else {
        "warn"
    }
}

/// Initialise env_logger. `RUST_LOG` always wins.
pub fn init_logging(verbose: bool) {
    let env = env_logger::Env::default().default_filter_or(default_log_filter(verbose));
    // A logger may already be installed when embedded; that is fine.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

/// Load `.env`, the config file and the environment, then apply CLI flags.
pub fn load_config(args: &CommonArgs) -> Result<ResolvedConfig, ConfigError> {
    if let Ok(path) = dotenv::dotenv() {
        log::debug!("loaded environment from {}", path.display());
    }
    let mut config = Config::load()?;
    apply_flags(&mut config, args);
    config.resolve()
}

fn apply_flags(config: &mut Config, args: &CommonArgs) {
    if args.no_stream {
        config.stream = false;
    }
}

/// Wire a conversation over HTTP with the given tools.
pub fn build_conversation(
    config: &ResolvedConfig,
    registry: ToolRegistry,
) -> Result<Conversation<HttpChatClient>, ChatError> {
    log::debug!(
        "chat endpoint {} (model {}, stream {}), {} tool(s)",
        config.api_url,
        config.model,
        config.stream,
        registry.len()
    );
    let client = HttpChatClient::new(config)?;
    Ok(Conversation::new(client, ToolDispatcher::new(registry), config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter() {
        assert_eq!(default_log_filter(false), "warn");
        assert!(default_log_filter(true).contains("toolchat_core=debug"));
    }

    #[test]
    fn test_no_stream_flag_overrides_config() {
        let mut config = Config::default();
        assert!(config.stream);
        apply_flags(
            &mut config,
            &CommonArgs {
                verbose: false,
                no_stream: true,
            },
        );
        assert!(!config.stream);
    }

    #[test]
    fn test_build_conversation_starts_empty() {
        let config = Config {
            api_url: Some("http://localhost:8000/v1".into()),
            api_key: Some("k".into()),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        let conversation = build_conversation(&config, ToolRegistry::new()).unwrap();
        assert!(conversation.transcript().is_empty());
        assert!(conversation.dispatcher().registry().is_empty());
    }
}
