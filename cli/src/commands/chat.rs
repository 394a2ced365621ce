//! # WeCredit Chat Command
//!
//! File: cli/src/commands/chat.rs
//!
//! ## Overview
//!
//! `wecredit chat` is the line-oriented front end: a read-eval-print loop over
//! stdin. Each line is answered in full before the next one is read.
//!
//! Inside the loop:
//! - `bye`, `exit` or `quit` ends the session
//! - blank lines are ignored
//! - `history` prints the conversation so far
//! - a number re-asks the matching suggestion from the previous reply
//!
//! ```text
//! Chat with WeCredit! Ask about loans, credit scores or interest rates. Type 'bye' to quit.
//! You: what is emi
//! WeCredit: EMI: Equated Monthly Instalment, ...
//! Suggestions: [1] Tell me about interest rates  [2] What is tenure
//! You: 1
//! ```
//!
use super::engine_args::{build_engine, EngineArgs};
use crate::common::transcript::Transcript;
use crate::core::error::Result;
use crate::engine::formatter::ChatResponse;
use crate::engine::ChatBot;
use anyhow::Context;
use clap::Parser;
use std::io::{self, BufRead, Write};
use tracing::info;

const EXIT_WORDS: [&str; 3] = ["bye", "exit", "quit"];

/// # Chat Arguments (`ChatArgs`)
#[derive(Parser, Debug)]
pub struct ChatArgs {
    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Who said a line of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One line of the session's conversation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Per-session state: the append-only history and the last offered suggestions.
#[derive(Debug, Default)]
struct Session {
    history: Vec<Turn>,
    last_suggestions: Vec<String>,
}

impl Session {
    /// Maps a suggestion number back to its text; anything else passes through.
    fn resolve_input(&self, input: &str) -> String {
        input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| self.last_suggestions.get(idx))
            .cloned()
            .unwrap_or_else(|| input.to_string())
    }

    fn record(&mut self, query: &str, response: &ChatResponse) {
        self.history.push(Turn {
            role: Role::User,
            content: query.to_string(),
        });
        self.history.push(Turn {
            role: Role::Assistant,
            content: response.text.clone(),
        });
        self.last_suggestions = response.suggestions.clone();
    }
}

/// # Handle Chat Command (`handle_chat`)
///
/// Builds the engine and runs the loop on stdin/stdout until the user leaves
/// or input ends.
pub async fn handle_chat(args: ChatArgs) -> Result<()> {
    info!("Handling chat command with args: {:?}", args);
    let engine = build_engine(&args.engine)?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_session(
        &engine.bot,
        engine.transcript.as_ref(),
        stdin.lock(),
        &mut stdout,
    )
    .await
}

/// Runs one conversation over arbitrary input/output streams.
pub async fn run_session<R: BufRead, W: Write>(
    bot: &ChatBot,
    transcript: Option<&Transcript>,
    input: R,
    output: &mut W,
) -> Result<()> {
    let mut session = Session::default();
    writeln!(
        output,
        "Chat with WeCredit! Ask about loans, credit scores or interest rates. Type 'bye' to quit."
    )?;

    let mut lines = input.lines();
    loop {
        write!(output, "You: ")?;
        output.flush().context("Failed to flush stdout")?;

        let line = match lines.next() {
            Some(line) => line.context("Failed to read input")?,
            None => {
                // End of input (Ctrl+D or a closed pipe).
                writeln!(output)?;
                break;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if EXIT_WORDS.iter().any(|w| trimmed.eq_ignore_ascii_case(w)) {
            writeln!(output, "WeCredit: Goodbye!")?;
            break;
        }
        if trimmed.eq_ignore_ascii_case("history") {
            print_history(&session.history, output)?;
            continue;
        }

        let query = session.resolve_input(trimmed);
        let response = bot.respond(&query, None).await;
        if let Some(transcript) = transcript {
            transcript.record(&query, &response.text);
        }

        writeln!(output, "WeCredit: {}", response.text)?;
        if !response.suggestions.is_empty() {
            let numbered: Vec<String> = response
                .suggestions
                .iter()
                .enumerate()
                .map(|(idx, s)| format!("[{}] {}", idx + 1, s))
                .collect();
            writeln!(output, "Suggestions: {}", numbered.join("  "))?;
        }
        session.record(&query, &response);
    }
    Ok(())
}

fn print_history<W: Write>(history: &[Turn], output: &mut W) -> Result<()> {
    if history.is_empty() {
        writeln!(output, "(no messages yet)")?;
        return Ok(());
    }
    for turn in history {
        let speaker = match turn.role {
            Role::User => "You",
            Role::Assistant => "WeCredit",
        };
        writeln!(output, "{}: {}", speaker, turn.content)?;
    }
    Ok(())
}
