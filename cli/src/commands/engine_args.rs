//! # Shared Engine Arguments
//!
//! File: cli/src/commands/engine_args.rs
//!
//! ## Overview
//!
//! `chat`, `ask` and `serve` all build the same answer engine, so they share
//! one set of flags ([`EngineArgs`], flattened into each command) and one
//! construction path ([`build_engine`]).
//!
//! Flags sit on top of the file configuration loaded by `core::config`:
//! a flag (or its environment variable) replaces the configured value, an
//! absent flag leaves it alone. After overrides are applied the configuration
//! is validated again.
//!
//! ```bash
//! # Offline: never call the fallback service
//! wecredit ask --no-fallback "what is emi"
//!
//! # Custom knowledge base, phrase layer on, transcript written
//! wecredit chat --knowledge ./kb.toml --intents --log-file ~/wecredit/chat.jsonl
//!
//! # Point the fallback at another OpenAI-compatible server
//! WECREDIT_API_BASE=http://localhost:11434/v1 WECREDIT_MODEL=llama3 wecredit chat
//! ```
//!
use crate::common::transcript::Transcript;
use crate::core::config::{self, Config};
use crate::core::error::Result;
use crate::engine::delegate::{FallbackDelegate, OpenAiClient};
use crate::engine::knowledge::KnowledgeStore;
use crate::engine::matcher::MatcherOptions;
use crate::engine::ChatBot;
use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// # Engine Arguments (`EngineArgs`)
///
/// Flags controlling the knowledge base, the matching layers, the fallback
/// delegate and the transcript.
#[derive(Args, Debug, Default, Clone)]
pub struct EngineArgs {
    /// Load the knowledge base from this TOML file instead of the built-in catalogue.
    #[arg(long, value_name = "FILE")]
    pub knowledge: Option<PathBuf>,

    /// Check the canned phrase lists before the knowledge-base key scan.
    #[arg(long)]
    pub intents: bool,

    /// Never call the fallback service; unmatched queries get a clarifying reply.
    #[arg(long)]
    pub no_fallback: bool,

    /// Model identifier for the fallback service.
    #[arg(long, env = "WECREDIT_MODEL")]
    pub model: Option<String>,

    /// API credential for the fallback service.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible fallback API.
    #[arg(long, env = "WECREDIT_API_BASE")]
    pub api_base: Option<String>,

    /// Maximum length of a fallback reply, in tokens.
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature for the fallback service.
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Append every exchange to this JSON-lines file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Everything a front end needs to answer queries.
pub struct Engine {
    pub bot: ChatBot,
    pub transcript: Option<Transcript>,
    pub config: Config,
}

/// # Build Engine (`build_engine`)
///
/// Loads configuration files, applies `args` on top, and assembles the engine.
pub fn build_engine(args: &EngineArgs) -> Result<Engine> {
    let mut cfg = config::load_config().context("Failed to load WeCredit configuration")?;
    apply_overrides(&mut cfg, args);
    config::validate_config(&cfg).context("Invalid engine options")?;
    build_from_config(cfg)
}

/// Writes explicitly given flags over the loaded configuration.
pub fn apply_overrides(cfg: &mut Config, args: &EngineArgs) {
    if let Some(path) = &args.knowledge {
        cfg.chat.knowledge_base = Some(path.to_string_lossy().into_owned());
    }
    if args.intents {
        cfg.chat.phrase_intents = true;
    }
    if args.no_fallback {
        cfg.delegate.enabled = false;
    }
    if let Some(model) = &args.model {
        cfg.delegate.model = model.clone();
    }
    if let Some(api_key) = &args.api_key {
        cfg.delegate.api_key = Some(api_key.clone());
    }
    if let Some(api_base) = &args.api_base {
        cfg.delegate.api_base = api_base.clone();
    }
    if let Some(max_tokens) = args.max_tokens {
        cfg.delegate.max_tokens = max_tokens;
    }
    if let Some(temperature) = args.temperature {
        cfg.delegate.temperature = temperature;
    }
    if let Some(path) = &args.log_file {
        cfg.chat.transcript = Some(path.to_string_lossy().into_owned());
    }
    config::expand_config_paths(cfg);
}

/// Loads the configured knowledge base, or the built-in catalogue when none is set.
pub fn load_store(cfg: &Config) -> Result<KnowledgeStore> {
    match &cfg.chat.knowledge_base {
        Some(path) => KnowledgeStore::load(Path::new(path)),
        None => {
            debug!("Using the built-in WeCredit knowledge base");
            Ok(KnowledgeStore::builtin())
        }
    }
}

/// Assembles an [`Engine`] from a final, validated configuration.
pub fn build_from_config(cfg: Config) -> Result<Engine> {
    let store = load_store(&cfg)?;
    let options = MatcherOptions {
        phrase_intents: cfg.chat.phrase_intents,
    };

    let delegate = if cfg.delegate.enabled {
        let client = OpenAiClient::new(&cfg.delegate)
            .context("Failed to create the fallback service client")?;
        info!(
            "Fallback service enabled (model {}, {})",
            cfg.delegate.model, cfg.delegate.api_base
        );
        Some(FallbackDelegate::new(Arc::new(client), &cfg.delegate))
    } else {
        info!("Fallback service disabled");
        None
    };

    let transcript = cfg.chat.transcript.as_ref().map(|path| {
        info!("Recording transcript to {}", path);
        Transcript::new(path)
    });

    Ok(Engine {
        bot: ChatBot::new(store, options, delegate),
        transcript,
        config: cfg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::knowledge::Intent;
    use crate::engine::matcher::MatchResult;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn overrides_replace_only_given_values() {
        let mut cfg = Config::default();
        let args = EngineArgs {
            no_fallback: true,
            intents: true,
            model: Some("gpt-4o-mini".into()),
            max_tokens: Some(64),
            ..EngineArgs::default()
        };
        apply_overrides(&mut cfg, &args);

        assert!(!cfg.delegate.enabled);
        assert!(cfg.chat.phrase_intents);
        assert_eq!(cfg.delegate.model, "gpt-4o-mini");
        assert_eq!(cfg.delegate.max_tokens, 64);
        assert_eq!(cfg.delegate.temperature, 0.7);
        assert_eq!(cfg.delegate.api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn default_engine_uses_builtin_catalogue() {
        let engine = build_from_config(Config::default()).unwrap();
        assert_eq!(engine.bot.store(), &KnowledgeStore::builtin());
        assert!(engine.transcript.is_none());
    }

    #[test]
    fn knowledge_file_and_intents_flow_into_the_bot() {
        let dir = tempdir().unwrap();
        let kb = dir.path().join("kb.toml");
        fs::write(
            &kb,
            r#"
            [[concepts]]
            key = "credit score"
            definition = "A number"
            range = "300-900"

            [[intents]]
            intent = "credit_score_info"
            phrases = ["credit rating"]
            "#,
        )
        .unwrap();

        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            &EngineArgs {
                knowledge: Some(kb),
                intents: true,
                no_fallback: true,
                log_file: Some(dir.path().join("log.jsonl")),
                ..EngineArgs::default()
            },
        );
        let engine = build_from_config(cfg).unwrap();

        assert_eq!(engine.bot.store().concepts.len(), 1);
        assert_eq!(
            engine.bot.classify("What is my credit rating?"),
            MatchResult::Intent(Intent::CreditScoreInfo)
        );
        assert_eq!(
            engine.transcript.unwrap().path(),
            dir.path().join("log.jsonl")
        );
    }

    #[test]
    fn missing_knowledge_file_is_an_error() {
        let mut cfg = Config::default();
        cfg.chat.knowledge_base = Some("/definitely/not/here.toml".into());
        assert!(build_from_config(cfg).is_err());
    }
}
