//! # WeCredit Ask Command
//!
//! File: cli/src/commands/ask.rs
//!
//! One-shot query: answers a single question and exits.
//!
//! ```bash
//! wecredit ask What is a credit score?
//! wecredit ask --json "tell me about pay later"
//! wecredit ask --context "salaried, 2 years experience" "can I get a loan abroad"
//! ```
//!
use super::engine_args::{build_engine, EngineArgs};
use crate::core::error::Result;
use crate::engine::formatter::ChatResponse;
use anyhow::Context;
use clap::Parser;
use tracing::info;

/// # Ask Arguments (`AskArgs`)
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// The question. Multiple words are joined with spaces.
    #[arg(required = true, num_args = 1.., value_name = "QUERY")]
    pub query: Vec<String>,

    /// Print the full response (text, suggestions, error) as JSON.
    #[arg(long)]
    pub json: bool,

    /// Extra context passed to the fallback service when it answers.
    #[arg(long)]
    pub context: Option<String>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// # Handle Ask Command (`handle_ask`)
pub async fn handle_ask(args: AskArgs) -> Result<()> {
    info!("Handling ask command with args: {:?}", args);
    let engine = build_engine(&args.engine)?;

    let query = args.query.join(" ");
    let response = engine.bot.respond(&query, args.context.as_deref()).await;
    if let Some(transcript) = &engine.transcript {
        transcript.record(&query, &response.text);
    }

    if args.json {
        let json =
            serde_json::to_string_pretty(&response).context("Failed to serialize response")?;
        println!("{}", json);
    } else {
        print!("{}", render_plain(&response));
    }
    Ok(())
}

/// Reply text, then a suggestions line when there are any.
fn render_plain(response: &ChatResponse) -> String {
    let mut out = format!("{}\n", response.text);
    if !response.suggestions.is_empty() {
        out.push_str(&format!(
            "\nSuggestions: {}\n",
            response.suggestions.join(" | ")
        ));
    }
    out
}
