//! # Response Formatter
//!
//! File: cli/src/engine/formatter.rs
//!
//! ## Overview
//!
//! Renders a [`MatchResult`] into the [`ChatResponse`] shown to the user. Each
//! variant has its own template:
//! - Concept: `"<Title>: <definition>"` followed by whichever structured facts
//!   the entry carries (types, score range, calculation, factors, providers,
//!   documents, key terms)
//! - Service: a `"WeCredit <Title>:"` header and one `"<Attribute>: <value>"` line
//!   per attribute
//! - FAQ: the canonical answer verbatim
//! - Intent: the canned templates of the phrase-list layer
//! - NoMatch: the fixed clarifying prompt with the top-level topics
//!
//! Formatting only fails when the match and the store disagree (a key that is
//! not in its table, or an intent whose backing data is incomplete). That is
//! reported as [`WecreditError::MatchInconsistency`]; the caller turns it into
//! [`ChatResponse::failure`].
//!
use super::knowledge::{ConceptEntry, Intent, KnowledgeStore};
use super::matcher::MatchResult;
use crate::core::error::WecreditError;
use serde::{Deserialize, Serialize};

/// Reply for queries nothing in the knowledge base covers.
pub const CLARIFY_TEXT: &str =
    "I'm not sure about that. Would you like to know about loans, credit scores, or interest rates?";

/// Suggestions offered alongside [`CLARIFY_TEXT`].
pub const TOP_LEVEL_SUGGESTIONS: [&str; 3] = ["Loan Types", "Credit Score", "Interest Rates"];

/// User-facing text when formatting fails; the cause goes to `error`.
pub const ERROR_TEXT: &str = "I encountered an error processing your request. Please try again.";

const DEFAULT_CONCEPT_SUGGESTIONS: [&str; 2] = ["Learn more", "Talk to an advisor"];
const DEFAULT_SERVICE_SUGGESTIONS: [&str; 2] = ["Check eligibility", "Talk to an advisor"];

/// # Chat Response (`ChatResponse`)
///
/// The structured reply for one query. `error` carries a diagnostic description
/// and is never meant to be shown raw to the end user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    pub suggestions: Vec<String>,
    pub error: Option<String>,
}

impl ChatResponse {
    /// A plain reply without suggestions, as produced by the fallback delegate.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            suggestions: Vec::new(),
            error: None,
        }
    }

    /// The generic apology substituted when formatting fails.
    pub fn failure(error: &WecreditError) -> Self {
        Self {
            text: ERROR_TEXT.to_string(),
            suggestions: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    /// The fixed clarifying reply for [`MatchResult::NoMatch`].
    pub fn clarify() -> Self {
        Self {
            text: CLARIFY_TEXT.to_string(),
            suggestions: to_strings(&TOP_LEVEL_SUGGESTIONS),
            error: None,
        }
    }
}

/// # Format Match (`format`)
///
/// Renders `result` using the entries in `store`.
pub fn format(
    result: &MatchResult,
    store: &KnowledgeStore,
) -> std::result::Result<ChatResponse, WecreditError> {
    match result {
        MatchResult::Concept(key) => {
            let entry = store
                .concept(key)
                .ok_or_else(|| missing_entry(key, "concept"))?;
            Ok(ChatResponse {
                text: render_concept(entry),
                suggestions: or_default(&entry.suggestions, &DEFAULT_CONCEPT_SUGGESTIONS),
                error: None,
            })
        }
        MatchResult::Service(key) => {
            let entry = store
                .service(key)
                .ok_or_else(|| missing_entry(key, "service"))?;
            let title = entry.title.clone().unwrap_or_else(|| title_case(&entry.key));
            let mut lines = vec![format!("WeCredit {}:", title)];
            lines.extend(
                entry
                    .attributes
                    .iter()
                    .map(|attr| format!("{}: {}", title_case(&attr.name), attr.value)),
            );
            Ok(ChatResponse {
                text: lines.join("\n"),
                suggestions: or_default(&entry.suggestions, &DEFAULT_SERVICE_SUGGESTIONS),
                error: None,
            })
        }
        MatchResult::Faq(question) => {
            let entry = store
                .faq(question)
                .ok_or_else(|| missing_entry(question, "FAQ"))?;
            Ok(ChatResponse {
                text: entry.answer.clone(),
                suggestions: entry.suggestions.clone(),
                error: None,
            })
        }
        MatchResult::Intent(intent) => format_intent(*intent, store),
        MatchResult::NoMatch => Ok(ChatResponse::clarify()),
    }
}

fn format_intent(
    intent: Intent,
    store: &KnowledgeStore,
) -> std::result::Result<ChatResponse, WecreditError> {
    let key = intent.concept_key();
    let entry = store
        .concept(key)
        .ok_or_else(|| missing_entry(key, "concept"))?;

    let (text, suggestions) = match intent {
        Intent::LoanTypes => (
            format!("We offer several types of loans:\n{}", bullets(&entry.types)),
            ["Tell me about interest rates", "How to check credit score"],
        ),
        Intent::CreditScoreInfo => {
            let range = entry
                .range
                .as_deref()
                .ok_or_else(|| WecreditError::MatchInconsistency {
                    key: entry.key.clone(),
                    detail: "missing score range".to_string(),
                })?;
            (
                format!(
                    "Credit score is {}.\nScore range: {}\nKey factors affecting credit score:\n{}",
                    lower_first(&entry.definition),
                    range,
                    bullets(&entry.factors)
                ),
                ["How to improve credit score", "Apply for loan"],
            )
        }
        Intent::InterestRates => (
            format!(
                "Interest rate is {}.\nTypes of interest rates:\n{}",
                lower_first(&entry.definition),
                bullets(&entry.types)
            ),
            ["Calculate EMI", "Compare loan options"],
        ),
    };
    Ok(ChatResponse {
        text,
        suggestions: to_strings(&suggestions),
        error: None,
    })
}

fn render_concept(entry: &ConceptEntry) -> String {
    let title = entry.title.clone().unwrap_or_else(|| title_case(&entry.key));
    let mut sections = vec![format!("{}: {}", title, entry.definition)];

    if !entry.types.is_empty() {
        sections.push(format!("Types:\n{}", bullets(&entry.types)));
    }
    if let Some(range) = &entry.range {
        sections.push(format!("Score range: {}", range));
    }
    if let Some(calculation) = &entry.calculation {
        sections.push(format!("Calculation: {}", calculation));
    }
    if !entry.factors.is_empty() {
        sections.push(format!("Key factors:\n{}", bullets(&entry.factors)));
    }
    if !entry.providers.is_empty() {
        sections.push(format!("Providers: {}", entry.providers.join(", ")));
    }
    if !entry.documentation.is_empty() {
        sections.push(format!(
            "Documents required:\n{}",
            bullets(&entry.documentation)
        ));
    }
    if !entry.key_terms.is_empty() {
        sections.push(format!("Key terms: {}", entry.key_terms.join(", ")));
    }
    sections.join("\n")
}

fn missing_entry(key: &str, table: &str) -> WecreditError {
    WecreditError::MatchInconsistency {
        key: key.to_string(),
        detail: format!("no such {} entry", table),
    }
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn or_default(suggestions: &[String], default: &[&str]) -> Vec<String> {
    if suggestions.is_empty() {
        to_strings(default)
    } else {
        suggestions.to_vec()
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Title-cases a key: `_` and whitespace separate words, each word gets an
/// upper-case first letter and lower-case rest (`"interest_rate"` -> `"Interest Rate"`).
pub fn title_case(key: &str) -> String {
    key.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
