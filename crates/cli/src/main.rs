//! Cipher CLI — the main entry point.
//!
//! Commands:
//! - `chat`      — Interactive chat or single-message mode
//! - `memory`    — Inspect the long-term memory store
//! - `tool-host` — Serve the tool registry over stdio

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "cipher",
    about = "Cipher — a conversational tool-calling assistant with long-term memory",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "cipher.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Inspect the long-term memory store
    Memory {
        #[command(subcommand)]
        command: MemoryCommands,
    },

    /// Serve the tool registry over stdio (out-of-process tool host)
    ToolHost,
}

#[derive(Subcommand)]
enum MemoryCommands {
    /// List all stored memories
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat { message } => commands::chat::run(&cli.config, message).await?,
        Commands::Memory {
            command: MemoryCommands::List,
        } => commands::memory::run_list(&cli.config).await?,
        Commands::ToolHost => commands::toolhost::run(&cli.config).await?,
    }

    Ok(())
}
