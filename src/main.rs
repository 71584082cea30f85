//! gemini-chat binary entry point

use std::io::Write;

use color_eyre::Result;
use futures::StreamExt;
use gemini_chat_client::{
    cli::{Cli, Commands},
    ChatClient, GeminiChatClient, Message,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Install error handler
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Set up logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("gemini_chat_client=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    match &cli.command {
        Commands::Ask { prompt } => {
            let client = GeminiChatClient::new(cli.resolve_config()?)?;
            let response = client.get_response(&[Message::user(prompt.as_str())]).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Stream { prompt } => {
            let client = GeminiChatClient::new(cli.resolve_config()?)?;
            let mut updates = client.get_streaming_response(&[Message::user(prompt.as_str())]);

            let mut stdout = std::io::stdout();
            while let Some(update) = updates.next().await {
                write!(stdout, "{}", update?.text())?;
                stdout.flush()?;
            }
            writeln!(stdout)?;
        }
        Commands::Version => {
            println!("gemini-chat version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
