//! # WeCredit Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! Entry point of the WeCredit assistant CLI. It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to the command handlers
//!
//! ## Architecture
//!
//! - Each top-level command (`chat`, `ask`, ...) is a variant of `Commands`
//! - Commands map to `handle_*` functions in their modules
//! - All errors propagate up to here for consistent reporting
//!
//! ## Examples
//!
//! ```bash
//! # Interactive session
//! wecredit chat
//!
//! # One question, more logging
//! wecredit -vv ask "what is a credit score"
//! ```
//!
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // Subcommand handlers (chat, ask, serve, topics)
mod common; // Shared utilities (fs, transcript)
mod core; // Infrastructure (errors, config)
mod engine; // Matching and response pipeline

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "wecredit",
    about = "💬 WeCredit: lending and credit FAQ assistant",
    long_about = "Answers questions about loans, credit scores, interest rates and WeCredit's\n\
                  services from a curated knowledge base, with an optional AI fallback.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// All available top-level commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive chat session.
    #[command(alias = "c")]
    Chat(commands::chat::ChatArgs),
    /// Answer a single question and exit.
    #[command(alias = "a")]
    Ask(commands::ask::AskArgs),
    /// Serve the assistant as an HTTP JSON API.
    Serve(commands::serve::ServeArgs),
    /// List the concepts, services and FAQs the assistant knows.
    #[command(alias = "t")]
    Topics(commands::topics::TopicsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Chat(args) => commands::chat::handle_chat(args).await,
        Commands::Ask(args) => commands::ask::handle_ask(args).await,
        Commands::Serve(args) => commands::serve::handle_serve(args).await,
        Commands::Topics(args) => commands::topics::handle_topics(args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
