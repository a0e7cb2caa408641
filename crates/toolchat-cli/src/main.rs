use clap::Parser;
use std::error::Error;
use std::io;
use std::process::ExitCode;
use toolchat_cli::cli::ChatCli;
use toolchat_cli::session;
use toolchat_cli::sink::TerminalSink;
use toolchat_core::ToolRegistry;
use toolchat_core::tools::register_local_tools;

async fn run(cli: ChatCli) -> Result<(), Box<dyn Error>> {
    let config = session::load_config(&cli.common)?;

    let mut registry = ToolRegistry::new();
    register_local_tools(&mut registry, &config.weather)?;
    let mut conversation = session::build_conversation(&config, registry)?;

    let query = cli.query_or_read(io::stdin().lock())?;
    if query.is_empty() {
        return Err("no question given (pass it as an argument or on stdin)".into());
    }

    let mut sink = TerminalSink::stdout(cli.common.verbose);
    let answer = conversation.send(&query, &mut sink).await?;
    sink.print_answer(&answer)?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = ChatCli::parse();
    session::init_logging(cli.common.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
