//! CLI argument parsing with clap.

use clap::{Args, Parser};
use std::io::{self, BufRead};
use std::path::PathBuf;

/// Flags shared by both binaries.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Show tool results, reasoning and debug logs on stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Use non-streaming chat calls
    #[arg(long = "no-stream")]
    pub no_stream: bool,
}

/// toolchat - ask an OpenAI-compatible model a question, with local time and weather tools
#[derive(Parser, Debug)]
#[command(
    name = "toolchat",
    version,
    about = "Ask an OpenAI-compatible model a question, with local time and weather tools",
    after_help = "Configuration is read from $TOOLCHAT_HOME/config.toml (default ~/.toolchat),\n\
                  .env and the environment (TOOLCHAT_API_URL, TOOLCHAT_API_KEY, TOOLCHAT_MODEL,\n\
                  OPENWEATHER_API_KEY)."
)]
pub struct ChatCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// The question. Read from stdin when omitted.
    #[arg(value_name = "QUERY")]
    pub query: Vec<String>,
}

impl ChatCli {
    /// The question from the arguments, or one line from `input`.
    pub fn query_or_read<R: BufRead>(&self, input: R) -> io::Result<String> {
        if !self.query.is_empty() {
            return Ok(self.query.join(" "));
        }
        read_line(input).map(|line| line.unwrap_or_default())
    }
}

/// toolchat-mcp - chat with tools served by an MCP server script
#[derive(Parser, Debug)]
#[command(
    name = "toolchat-mcp",
    version,
    about = "Chat with tools served by an MCP server script",
    after_help = "Type 'quit' to exit."
)]
pub struct McpCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Path to the server script (.py runs with python, anything else with node)
    #[arg(value_name = "SERVER_SCRIPT")]
    pub server_script: PathBuf,
}

/// Read one trimmed line. `None` at end of input.
pub fn read_line<R: BufRead>(mut input: R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Whether an interactive line asks to leave the loop.
pub fn is_quit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("quit")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Cursor;

    #[test]
    fn test_clap_definitions_are_valid() {
        ChatCli::command().debug_assert();
        McpCli::command().debug_assert();
    }

    #[test]
    fn test_chat_flags() {
        let cli = ChatCli::try_parse_from(["toolchat", "-v", "--no-stream"]).unwrap();
        assert!(cli.common.verbose);
        assert!(cli.common.no_stream);
        assert!(cli.query.is_empty());
    }

    #[test]
    fn test_query_from_args_or_stdin() {
        let cli = ChatCli::try_parse_from(["toolchat", "北京天气", "如何？"]).unwrap();
        assert_eq!(cli.query_or_read(Cursor::new("ignored")).unwrap(), "北京天气 如何？");

        let cli = ChatCli::try_parse_from(["toolchat"]).unwrap();
        assert_eq!(
            cli.query_or_read(Cursor::new("  现在几点？\nsecond line\n")).unwrap(),
            "现在几点？"
        );
        assert_eq!(cli.query_or_read(Cursor::new("")).unwrap(), "");
    }

    #[test]
    fn test_mcp_requires_script() {
        assert!(McpCli::try_parse_from(["toolchat-mcp"]).is_err());
        let cli = McpCli::try_parse_from(["toolchat-mcp", "server.py"]).unwrap();
        assert_eq!(cli.server_script, PathBuf::from("server.py"));
    }

    #[test]
    fn test_read_line_and_quit() {
        assert_eq!(read_line(Cursor::new("")).unwrap(), None);
        assert_eq!(read_line(Cursor::new("  hi \n")).unwrap().as_deref(), Some("hi"));
        assert!(is_quit("quit"));
        assert!(is_quit(" QUIT "));
        assert!(!is_quit("quite"));
    }
}
