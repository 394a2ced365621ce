//! # Intent Matcher
//!
//! File: cli/src/engine/matcher.rs
//!
//! ## Overview
//!
//! Decides which knowledge-base entry, if any, answers a normalized query.
//! Matching is a fixed-precedence linear scan; the first hit wins and nothing
//! is scored across tables:
//!
//! 1. Phrase lists (only when [`MatcherOptions::phrase_intents`] is set)
//! 2. Concept keys, as substrings of the query
//! 3. Service keys, as substrings of the query
//! 4. FAQ questions, by word overlap strictly above [`FAQ_SIMILARITY_THRESHOLD`]
//! 5. Concept keys with `_` read as spaces (the topic check)
//! 6. Otherwise [`MatchResult::NoMatch`]
//!
//! The query must already be normalized (see `engine::normalize`). Keys,
//! phrases and FAQ questions are normalized the same way before comparison, so
//! entries loaded from a file may use any case or punctuation.
//!
use super::knowledge::{Intent, KnowledgeStore};
use super::normalize::normalize;
use std::collections::HashSet;
use tracing::debug;

/// Minimum share of a FAQ question's tokens the query must contain. Strict `>`.
pub const FAQ_SIMILARITY_THRESHOLD: f64 = 0.3;

/// Outcome of matching a single query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// A concept key; holds the key as stored.
    Concept(String),
    /// A service key.
    Service(String),
    /// A FAQ entry; holds its canonical question.
    Faq(String),
    /// A canned intent from the phrase-list layer.
    Intent(Intent),
    NoMatch,
}

/// Switches for the optional matching layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatcherOptions {
    pub phrase_intents: bool,
}

/// # Match Query (`match_query`)
///
/// Runs the precedence chain described in the module docs against `store`.
pub fn match_query(query: &str, store: &KnowledgeStore, options: MatcherOptions) -> MatchResult {
    if options.phrase_intents {
        if let Some(intent) = match_phrase_intent(query, store) {
            debug!("Query matched phrase intent '{}'", intent.name());
            return MatchResult::Intent(intent);
        }
    }

    if let Some(entry) = store
        .concepts
        .iter()
        .find(|c| query.contains(normalize(&c.key).as_str()))
    {
        debug!("Query matched concept '{}'", entry.key);
        return MatchResult::Concept(entry.key.clone());
    }

    if let Some(entry) = store
        .services
        .iter()
        .find(|s| query.contains(normalize(&s.key).as_str()))
    {
        debug!("Query matched service '{}'", entry.key);
        return MatchResult::Service(entry.key.clone());
    }

    let query_tokens = tokens(query);
    for entry in &store.faqs {
        let similarity = word_overlap(&query_tokens, &normalize(&entry.question));
        if similarity > FAQ_SIMILARITY_THRESHOLD {
            debug!(
                "Query matched FAQ '{}' (similarity {:.2})",
                entry.question, similarity
            );
            return MatchResult::Faq(entry.question.clone());
        }
    }

    if let Some(entry) = store
        .concepts
        .iter()
        .find(|c| query.contains(normalize(&c.key.replace('_', " ")).as_str()))
    {
        debug!("Query matched topic '{}'", entry.key);
        return MatchResult::Concept(entry.key.clone());
    }

    debug!("No knowledge-base entry matched query '{}'", query);
    MatchResult::NoMatch
}

fn match_phrase_intent(query: &str, store: &KnowledgeStore) -> Option<Intent> {
    store
        .intents
        .iter()
        .find(|list| {
            list.phrases
                .iter()
                .any(|p| query.contains(normalize(p).as_str()))
        })
        .map(|list| list.intent)
}

fn tokens(text: &str) -> HashSet<&str> {
    text.split_whitespace().collect()
}

/// Share of `question`'s distinct tokens that also occur in `query_tokens`.
/// A question without tokens scores 0.
pub fn word_overlap(query_tokens: &HashSet<&str>, question: &str) -> f64 {
    let question_tokens = tokens(question);
    if question_tokens.is_empty() {
        return 0.0;
    }
    let shared = question_tokens.intersection(query_tokens).count();
    shared as f64 / question_tokens.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::knowledge::{ConceptEntry, FaqEntry, KnowledgeStore};

    fn builtin_match(raw: &str) -> MatchResult {
        match_query(
            &normalize(raw),
            &KnowledgeStore::builtin(),
            MatcherOptions::default(),
        )
    }

    fn faq_only_store(question: &str) -> KnowledgeStore {
        KnowledgeStore::new(
            Vec::new(),
            Vec::new(),
            vec![FaqEntry {
                question: question.to_string(),
                answer: "answer".to_string(),
                suggestions: Vec::new(),
            }],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn every_concept_key_matches_itself() {
        let store = KnowledgeStore::builtin();
        for entry in &store.concepts {
            assert_eq!(
                match_query(&entry.key, &store, MatcherOptions::default()),
                MatchResult::Concept(entry.key.clone())
            );
        }
    }

    #[test]
    fn every_service_key_matches_itself() {
        let store = KnowledgeStore::builtin();
        for entry in &store.services {
            assert_eq!(
                match_query(&entry.key, &store, MatcherOptions::default()),
                MatchResult::Service(entry.key.clone())
            );
        }
    }

    #[test]
    fn every_faq_question_matches_its_own_entry() {
        let store = KnowledgeStore::builtin();
        for entry in &store.faqs {
            assert_eq!(
                match_query(&normalize(&entry.question), &store, MatcherOptions::default()),
                MatchResult::Faq(entry.question.clone())
            );
        }
    }

    #[test]
    fn concept_beats_service() {
        assert_eq!(
            builtin_match("Is a loan cheaper than a credit line?"),
            MatchResult::Concept("loan".into())
        );
    }

    #[test]
    fn loan_question_matches_loan_concept() {
        assert_eq!(
            builtin_match("What are the types of loans?"),
            MatchResult::Concept("loan".into())
        );
    }

    #[test]
    fn cibil_matches_by_substring() {
        assert_eq!(
            builtin_match("tell me about cibil score"),
            MatchResult::Concept("cibil".into())
        );
    }

    #[test]
    fn service_matches_when_no_concept_does() {
        assert_eq!(
            builtin_match("Tell me about the WeCredit credit line"),
            MatchResult::Service("credit line".into())
        );
    }

    #[test]
    fn faq_matches_despite_trailing_question_mark() {
        assert_eq!(
            builtin_match("How do I check my eligibility?"),
            MatchResult::Faq("how do i check my eligibility".into())
        );
    }

    #[test]
    fn nonsense_is_no_match() {
        assert_eq!(builtin_match("asdkjasd nonsense query"), MatchResult::NoMatch);
        assert_eq!(builtin_match(""), MatchResult::NoMatch);
    }

    #[test]
    fn faq_threshold_is_strict() {
        let store = faq_only_store("alpha bravo charlie delta echo foxtrot golf hotel india juliet");
        let opts = MatcherOptions::default();

        // 3 of 10 tokens: exactly 0.3, must not match.
        assert_eq!(
            match_query("alpha bravo charlie", &store, opts),
            MatchResult::NoMatch
        );
        // 4 of 10 tokens: 0.4, matches.
        assert_eq!(
            match_query("alpha bravo charlie delta", &store, opts),
            MatchResult::Faq(
                "alpha bravo charlie delta echo foxtrot golf hotel india juliet".into()
            )
        );
    }

    #[test]
    fn word_overlap_counts_distinct_question_tokens() {
        let query: HashSet<&str> = ["a", "b"].into_iter().collect();
        assert_eq!(word_overlap(&query, "a a b c"), 2.0 / 3.0);
        assert_eq!(word_overlap(&query, ""), 0.0);
        assert_eq!(word_overlap(&HashSet::new(), "a b"), 0.0);
    }

    #[test]
    fn phrase_layer_runs_first_when_enabled() {
        let store = KnowledgeStore::builtin();
        let query = normalize("What are my loan options?");
        assert_eq!(
            match_query(&query, &store, MatcherOptions::default()),
            MatchResult::Concept("loan".into())
        );
        assert_eq!(
            match_query(&query, &store, MatcherOptions { phrase_intents: true }),
            MatchResult::Intent(Intent::LoanTypes)
        );
        assert_eq!(
            match_query(
                &normalize("What is the rate of interest?"),
                &store,
                MatcherOptions { phrase_intents: true }
            ),
            MatchResult::Intent(Intent::InterestRates)
        );
    }

    #[test]
    fn mixed_case_and_punctuated_keys_match_themselves() {
        let store = KnowledgeStore::from_toml_str(
            r#"
            [[concepts]]
            key = "EMI"
            definition = "Monthly instalment"

            [[services]]
            key = "Pay-Later"

            [[intents]]
            intent = "credit_score_info"
            phrases = ["CIBIL Score"]
            "#,
        )
        .unwrap();
        let opts = MatcherOptions { phrase_intents: true };

        assert_eq!(
            match_query(&normalize("EMI"), &store, opts),
            MatchResult::Concept("EMI".into())
        );
        assert_eq!(
            match_query(&normalize("Pay-Later"), &store, opts),
            MatchResult::Service("Pay-Later".into())
        );
        assert_eq!(
            match_query(&normalize("What is my CIBIL score?"), &store, opts),
            MatchResult::Intent(Intent::CreditScoreInfo)
        );
    }

    #[test]
    fn topic_check_reads_underscores_as_spaces() {
        let store = KnowledgeStore::new(
            vec![ConceptEntry {
                key: "credit_score".to_string(),
                title: None,
                definition: "A number".to_string(),
                types: Vec::new(),
                range: None,
                providers: Vec::new(),
                factors: Vec::new(),
                documentation: Vec::new(),
                calculation: None,
                key_terms: Vec::new(),
                suggestions: Vec::new(),
            }],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(
            match_query("what is a credit score", &store, MatcherOptions::default()),
            MatchResult::Concept("credit_score".into())
        );
    }
}
