use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use tracing_subscriber::EnvFilter;

use snowfall::chat::{build_chat_request, check_status, stream_reply};
use snowfall::client::OpenAiCompatClient;
use snowfall::config::SnowfallConfig;
use snowfall::models::ChatMessage;

const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a friendly, patient tutor. Explain clearly, check understanding and use examples.";

#[derive(Parser)]
#[command(name = "snowfall", version, about = "Chat with an AI tutor from the terminal")]
struct Cli {
    /// TOML config file; environment variables are used when omitted
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a question and stream the reply
    Chat {
        #[arg(short, long)]
        model: Option<String>,

        #[arg(short, long, default_value = DEFAULT_SYSTEM_PROMPT)]
        system: String,

        prompt: String,
    },
    /// List models offered by the endpoint
    Models,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("snowfall=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SnowfallConfig::from_file(path)?,
        None => SnowfallConfig::from_env()?,
    };
    config.validate()?;

    let client = OpenAiCompatClient::new(config.api.clone())?;

    match cli.command {
        Command::Chat {
            model,
            system,
            prompt,
        } => {
            let request = build_chat_request(
                model.as_deref(),
                &config.api.default_model,
                &[ChatMessage::user(prompt)],
                &system,
            );
            let mut reply = stream_reply(&client, request)
                .await
                .context("failed to start chat")?;

            let mut stdout = std::io::stdout();
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            loop {
                tokio::select! {
                    _ = &mut ctrl_c => {
                        writeln!(stdout)?;
                        eprintln!("[interrupted]");
                        break;
                    }
                    next = reply.next_fragment() => match next {
                        Some(Ok(fragment)) => {
                            write!(stdout, "{}", fragment)?;
                            stdout.flush()?;
                        }
                        Some(Err(e)) => {
                            writeln!(stdout)?;
                            return Err(e).context("reply interrupted");
                        }
                        None => {
                            writeln!(stdout)?;
                            break;
                        }
                    }
                }
            }
        }
        Command::Models => {
            let status = check_status(&client).await;
            if !status.available {
                anyhow::bail!("model endpoint at {} is unavailable", config.api.base_url);
            }
            for model in status.models {
                println!("{}", model.id);
            }
        }
    }

    Ok(())
}
