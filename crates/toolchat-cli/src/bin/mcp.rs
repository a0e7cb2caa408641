use clap::Parser;
use std::error::Error;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use toolchat_cli::cli::{McpCli, is_quit, read_line};
use toolchat_cli::session;
use toolchat_cli::sink::TerminalSink;
use toolchat_core::ToolRegistry;
use toolchat_core::tools::mcp::{McpPeer, register_remote_tools};

async fn run(cli: McpCli) -> Result<(), Box<dyn Error>> {
    let config = session::load_config(&cli.common)?;

    let peer = Arc::new(McpPeer::connect(&cli.server_script, config.mcp.call_timeout()).await?);
    let mut registry = ToolRegistry::new();
    let count = register_remote_tools(Arc::clone(&peer), &mut registry, config.mcp.call_timeout());
    let names: Vec<&str> = registry.definitions().map(|d| d.name.as_str()).collect();
    println!("Connected to {} ({} tools: {})", cli.server_script.display(), count, names.join(", "));

    let mut conversation = session::build_conversation(&config, registry)?;
    let mut sink = TerminalSink::stdout(cli.common.verbose);

    println!("Type your question, or 'quit' to exit.");
    let stdin = io::stdin();
    loop {
        print!("\nQuery: ");
        io::stdout().flush()?;

        let Some(line) = read_line(stdin.lock())? else {
            break;
        };
        if line.is_empty() {
            continue;
        }
        if is_quit(&line) {
            break;
        }

        let answer = conversation.send(&line, &mut sink).await?;
        sink.print_answer(&answer)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = McpCli::parse();
    session::init_logging(cli.common.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
