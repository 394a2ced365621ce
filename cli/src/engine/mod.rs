//! # WeCredit Answer Engine
//!
//! File: cli/src/engine/mod.rs
//!
//! ## Overview
//!
//! The query-to-answer pipeline shared by every front end (`chat`, `ask`,
//! `serve`):
//!
//! ```text
//! raw input -> normalize -> match_query -> format          (entry found)
//!                                       -> FallbackDelegate (NoMatch, delegate configured)
//! ```
//!
//! ## Architecture
//!
//! - `knowledge`: the immutable tables (`KnowledgeStore`)
//! - `normalize`: `normalize()`, the canonical query form
//! - `matcher`: `match_query()` and the `MatchResult` sum type
//! - `formatter`: `format()` and the `ChatResponse` it produces
//! - `delegate`: `FallbackDelegate` and its `TextGenerator` transport
//!
//! `ChatBot` ties these together. It holds no mutable state, so one instance
//! can serve any number of sequential or concurrent requests.
//!
pub mod delegate;
pub mod formatter;
pub mod knowledge;
pub mod matcher;
pub mod normalize;

use delegate::FallbackDelegate;
use formatter::ChatResponse;
use knowledge::KnowledgeStore;
use matcher::{MatchResult, MatcherOptions};
use tracing::{debug, error, info};

/// # Chat Bot (`ChatBot`)
///
/// The assembled pipeline: a knowledge store, matcher options and an optional
/// fallback delegate.
pub struct ChatBot {
    store: KnowledgeStore,
    options: MatcherOptions,
    delegate: Option<FallbackDelegate>,
}

impl ChatBot {
    pub fn new(
        store: KnowledgeStore,
        options: MatcherOptions,
        delegate: Option<FallbackDelegate>,
    ) -> Self {
        Self {
            store,
            options,
            delegate,
        }
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Normalizes and matches `raw` without formatting.
    pub fn classify(&self, raw: &str) -> MatchResult {
        let query = normalize::normalize(raw);
        matcher::match_query(&query, &self.store, self.options)
    }

    /// # Respond (`respond`)
    ///
    /// Answers one query. Unmatched queries go to the fallback delegate when one
    /// is configured (with `context` forwarded), otherwise they get the fixed
    /// clarifying reply. A formatting inconsistency yields the generic error
    /// response with `error` set. This never fails.
    pub async fn respond(&self, raw: &str, context: Option<&str>) -> ChatResponse {
        let result = self.classify(raw);
        debug!("Match result for {:?}: {:?}", raw, result);

        if let (MatchResult::NoMatch, Some(delegate)) = (&result, &self.delegate) {
            info!("No local answer; forwarding query to the fallback service");
            let reply = delegate.delegate(raw.trim(), context).await;
            return ChatResponse::text_only(reply);
        }

        formatter::format(&result, &self.store).unwrap_or_else(|e| {
            error!("Failed to format response: {}", e);
            ChatResponse::failure(&e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DelegateConfig;
    use crate::core::error::WecreditError;
    use async_trait::async_trait;
    use delegate::{CompletionRequest, TextGenerator, APOLOGY};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for CountingGenerator {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, WecreditError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("generated: {}", request.messages[1].content))
        }
    }

    struct DownGenerator;

    #[async_trait]
    impl TextGenerator for DownGenerator {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, WecreditError> {
            Err(WecreditError::Delegate("connection refused".into()))
        }
    }

    fn offline_bot() -> ChatBot {
        ChatBot::new(KnowledgeStore::builtin(), MatcherOptions::default(), None)
    }

    #[tokio::test]
    async fn loan_types_question() {
        let response = offline_bot().respond("What are the types of loans?", None).await;
        assert!(response.text.starts_with("Loan:"));
        for loan_type in ["Personal Loan", "Home Loan", "Business Loan", "Education Loan"] {
            assert!(response.text.contains(loan_type));
        }
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn cibil_question_includes_range() {
        let response = offline_bot().respond("tell me about cibil score", None).await;
        assert!(response.text.contains("300-900"));
    }

    #[tokio::test]
    async fn nonsense_without_delegate_is_clarified() {
        let response = offline_bot().respond("asdkjasd nonsense query", None).await;
        assert_eq!(response.text, formatter::CLARIFY_TEXT);
        assert_eq!(
            response.suggestions,
            vec!["Loan Types", "Credit Score", "Interest Rates"]
        );
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn only_unmatched_queries_reach_the_delegate() {
        let generator = Arc::new(CountingGenerator::default());
        let delegate = FallbackDelegate::new(generator.clone(), &DelegateConfig::default());
        let bot = ChatBot::new(
            KnowledgeStore::builtin(),
            MatcherOptions::default(),
            Some(delegate),
        );

        let matched = bot.respond("What is EMI?", None).await;
        assert!(matched.text.starts_with("EMI:"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);

        let forwarded = bot.respond("  asdkjasd nonsense query ", Some("ctx")).await;
        assert_eq!(forwarded.text, "generated: asdkjasd nonsense query\n\nContext: ctx");
        assert!(forwarded.suggestions.is_empty());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delegate_failure_yields_apology() {
        let delegate = FallbackDelegate::new(Arc::new(DownGenerator), &DelegateConfig::default());
        let bot = ChatBot::new(
            KnowledgeStore::builtin(),
            MatcherOptions::default(),
            Some(delegate),
        );
        let response = bot.respond("asdkjasd nonsense query", None).await;
        assert_eq!(response.text, APOLOGY);
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn loaded_keys_match_regardless_of_case_and_punctuation() {
        let store = KnowledgeStore::from_toml_str(
            r#"
            [[concepts]]
            key = "EMI"
            definition = "Equated Monthly Instalment"

            [[services]]
            key = "Pay-Later"
            attributes = [{ name = "credit_limit", value = "Up to 50,000" }]
            "#,
        )
        .unwrap();
        let bot = ChatBot::new(store, MatcherOptions::default(), None);

        assert_eq!(bot.classify("EMI"), MatchResult::Concept("EMI".into()));
        assert_eq!(bot.classify("what is emi?"), MatchResult::Concept("EMI".into()));
        assert_eq!(
            bot.classify("Pay-Later"),
            MatchResult::Service("Pay-Later".into())
        );

        let response = bot.respond("Tell me about Pay-Later", None).await;
        assert!(response.text.contains("Credit Limit: Up to 50,000"));
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn inconsistent_store_yields_error_response() {
        // Phrase layer points at "credit score", which this store lacks.
        let mut store = KnowledgeStore::builtin();
        store.concepts.retain(|c| c.key != "credit score");
        let bot = ChatBot::new(store, MatcherOptions { phrase_intents: true }, None);

        let response = bot.respond("What is credit score?", None).await;
        assert_eq!(response.text, formatter::ERROR_TEXT);
        assert!(response.error.unwrap().contains("credit score"));
    }
}
