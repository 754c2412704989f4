mod app;
mod chat;
mod commands;
mod config;
mod events;
mod llm;
mod prompts;
mod tui;
mod ui;

use anyhow::{Context, Result};
use chat::TurnExecutor;
use clap::{Parser, Subcommand};
use config::Config;
use llm::GeminiClient;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::Instrument;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rigchat")]
#[command(version)]
#[command(about = "Chat with the ArcaneRigs PC hardware assistant", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to ~/.rigchat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured model
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
}

/// The TUI owns the terminal, so it logs to a file; one-shot commands log to stderr.
fn init_logging(interactive: bool) -> Result<()> {
    if interactive {
        let dir = Config::home_dir()?;
        fs::create_dir_all(&dir).context("Failed to create .rigchat directory")?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("rigchat.log"))
            .context("Failed to open log file")?;

        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "rigchat=info".into()))
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "rigchat=warn".into()))
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(model) = cli.model {
        config.model = model;
    }

    init_logging(cli.command.is_none())?;

    let session_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("session", id = %session_id, model = %config.model);
    run(cli.command, config).instrument(span).await
}

async fn run(command: Option<Commands>, config: Config) -> Result<()> {
    if !config.has_api_key() {
        tracing::warn!("no Gemini API key configured; turns will be rejected");
    }

    let client = GeminiClient::new(&config).context("Failed to build Gemini client")?;
    let executor = TurnExecutor::new(Arc::new(client), config.system_instruction.clone());

    match command {
        None => app::run(&config, executor).await,
        Some(Commands::Ask { question }) => {
            let reply = commands::ask(&config, &executor, &question.join(" ")).await?;
            println!("{}", reply);
            Ok(())
        }
    }
}
