//! # WeCredit Topics Command
//!
//! File: cli/src/commands/topics.rs
//!
//! Lists what the assistant can answer locally: concept keys, service keys and
//! FAQ questions, each in lookup order. The same listing backs
//! `GET /api/topics` in `wecredit serve`.
//!
//! ```text
//! Concepts (7)
//!   1. loan
//!   2. cibil
//!   ...
//! ```
//!
use super::engine_args::{apply_overrides, load_store, EngineArgs};
use crate::core::config;
use crate::core::error::Result;
use crate::engine::knowledge::KnowledgeStore;
use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// # Topics Arguments (`TopicsArgs`)
#[derive(Parser, Debug)]
pub struct TopicsArgs {
    /// List the entries of this TOML knowledge base instead of the built-in catalogue.
    #[arg(long, value_name = "FILE")]
    pub knowledge: Option<PathBuf>,

    /// Print the listing as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Keys and questions of a knowledge store, in lookup order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicIndex {
    pub concepts: Vec<String>,
    pub services: Vec<String>,
    pub faqs: Vec<String>,
}

impl TopicIndex {
    pub fn from_store(store: &KnowledgeStore) -> Self {
        Self {
            concepts: store.concepts.iter().map(|c| c.key.clone()).collect(),
            services: store.services.iter().map(|s| s.key.clone()).collect(),
            faqs: store.faqs.iter().map(|f| f.question.clone()).collect(),
        }
    }
}

/// # Handle Topics Command (`handle_topics`)
pub async fn handle_topics(args: TopicsArgs) -> Result<()> {
    info!("Handling topics command with args: {:?}", args);

    let mut cfg = config::load_config().context("Failed to load WeCredit configuration")?;
    apply_overrides(
        &mut cfg,
        &EngineArgs {
            knowledge: args.knowledge.clone(),
            ..EngineArgs::default()
        },
    );
    let store = load_store(&cfg)?;
    let index = TopicIndex::from_store(&store);

    if args.json {
        let json =
            serde_json::to_string_pretty(&index).context("Failed to serialize topic listing")?;
        println!("{}", json);
    } else {
        print!("{}", render_table(&index));
    }
    Ok(())
}

fn render_table(index: &TopicIndex) -> String {
    let mut out = String::new();
    for (heading, items) in [
        ("Concepts", &index.concepts),
        ("Services", &index.services),
        ("FAQs", &index.faqs),
    ] {
        out.push_str(&format!("{} ({})\n", heading, items.len()));
        if items.is_empty() {
            out.push_str("  (none)\n");
        }
        for (idx, item) in items.iter().enumerate() {
            out.push_str(&format!("  {:>2}. {}\n", idx + 1, item));
        }
        out.push('\n');
    }
    out
}
