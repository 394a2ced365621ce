//! # WeCredit Knowledge Store
//!
//! File: cli/src/engine/knowledge.rs
//!
//! ## Overview
//!
//! The knowledge store holds the immutable reference data the assistant answers
//! from. It is assembled once at startup, either from the built-in WeCredit
//! catalogue ([`KnowledgeStore::builtin`]) or from a TOML file
//! ([`KnowledgeStore::load`]), and is never mutated afterwards, so it can be
//! shared freely (the HTTP service wraps it in an `Arc`).
//!
//! ## Tables
//!
//! Four separate, ordered tables. Order matters: the matcher scans each table
//! in insertion order and the first hit wins.
//! - `concepts`: financial terms with a definition and structured facts
//! - `services`: WeCredit products as ordered attribute/value pairs
//! - `faqs`: canonical question/answer pairs
//! - `intents`: canned phrase lists for the optional phrase layer
//!
//! Keys are unique within a table; the same text may appear in two tables
//! without conflict because the tables are separate namespaces. Keys and
//! phrases may use any case or punctuation: the matcher compares their
//! normalized form, so `"EMI"` and `"Pay-Later"` behave like `"emi"` and
//! `"paylater"`.
//!
//! ## File Format
//!
//! ```toml
//! [[concepts]]
//! key = "loan"
//! definition = "A sum of money borrowed that is expected to be paid back with interest"
//! types = ["Personal Loan", "Home Loan"]
//!
//! [[services]]
//! key = "credit line"
//! attributes = [{ name = "interest_rate", value = "1.25% - 3% per month" }]
//!
//! [[faqs]]
//! question = "how long does approval take"
//! answer = "Most approvals are instant."
//!
//! [[intents]]
//! intent = "loan_types"
//! phrases = ["what types of loans", "loan options"]
//! ```
//!
use super::normalize::normalize;
use crate::core::error::{Result, WecreditError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// A financial term with its definition and optional structured facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConceptEntry {
    pub key: String,
    /// Display name; the title-cased key is used when absent.
    #[serde(default)]
    pub title: Option<String>,
    pub definition: String,
    #[serde(default)]
    pub types: Vec<String>,
    /// Numeric range, e.g. a score range like "300-900".
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub factors: Vec<String>,
    #[serde(default)]
    pub documentation: Vec<String>,
    #[serde(default)]
    pub calculation: Option<String>,
    #[serde(default)]
    pub key_terms: Vec<String>,
    /// Follow-up prompts offered after this concept is shown.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// A single `name: value` line of a service entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceAttribute {
    pub name: String,
    pub value: String,
}

/// A WeCredit product offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceEntry {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub attributes: Vec<ServiceAttribute>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// A canonical question and its canned answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// The canned intents recognised by the phrase-list layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    LoanTypes,
    CreditScoreInfo,
    InterestRates,
}

impl Intent {
    /// Key of the concept entry whose data the intent's template renders.
    pub fn concept_key(self) -> &'static str {
        match self {
            Intent::LoanTypes => "loan",
            Intent::CreditScoreInfo => "credit score",
            Intent::InterestRates => "interest rate",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Intent::LoanTypes => "loan_types",
            Intent::CreditScoreInfo => "credit_score_info",
            Intent::InterestRates => "interest_rates",
        }
    }
}

/// Phrases that map a query straight to an [`Intent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntentPhrases {
    pub intent: Intent,
    pub phrases: Vec<String>,
}

/// # Knowledge Store (`KnowledgeStore`)
///
/// Read-only container for the four lookup tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KnowledgeStore {
    #[serde(default)]
    pub concepts: Vec<ConceptEntry>,
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
    #[serde(default)]
    pub faqs: Vec<FaqEntry>,
    #[serde(default)]
    pub intents: Vec<IntentPhrases>,
}

impl KnowledgeStore {
    /// Builds a store from already-assembled tables, validating key uniqueness.
    pub fn new(
        concepts: Vec<ConceptEntry>,
        services: Vec<ServiceEntry>,
        faqs: Vec<FaqEntry>,
        intents: Vec<IntentPhrases>,
    ) -> std::result::Result<Self, WecreditError> {
        let store = Self {
            concepts,
            services,
            faqs,
            intents,
        };
        store.validate()?;
        Ok(store)
    }

    /// # Load Knowledge Base (`load`)
    ///
    /// Reads and validates a TOML knowledge base from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading knowledge base from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read knowledge base: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid knowledge base: {}", path.display()))
    }

    /// Parses and validates a knowledge base from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let store: KnowledgeStore =
            toml::from_str(content).context("Failed to parse knowledge base TOML")?;
        store.validate()?;
        debug!(
            "Knowledge base parsed: {} concepts, {} services, {} FAQs, {} intent lists",
            store.concepts.len(),
            store.services.len(),
            store.faqs.len(),
            store.intents.len()
        );
        Ok(store)
    }

    fn validate(&self) -> std::result::Result<(), WecreditError> {
        ensure_unique("concept", self.concepts.iter().map(|c| c.key.as_str()))?;
        ensure_unique("service", self.services.iter().map(|s| s.key.as_str()))?;
        ensure_unique("FAQ", self.faqs.iter().map(|f| f.question.as_str()))?;

        let mut seen_intents = HashSet::new();
        for list in &self.intents {
            if !seen_intents.insert(list.intent) {
                return Err(WecreditError::KnowledgeBase(format!(
                    "Duplicate phrase list for intent '{}'.",
                    list.intent.name()
                )));
            }
            if list.phrases.iter().any(|p| normalize(p).is_empty()) {
                return Err(WecreditError::KnowledgeBase(format!(
                    "Intent '{}' has an empty phrase.",
                    list.intent.name()
                )));
            }
        }

        for key in self.shadowed_concept_keys() {
            warn!(
                "Concept key '{}' contains an earlier concept key and will never match on its own.",
                key
            );
        }
        for key in self.shadowed_service_keys() {
            warn!(
                "Service key '{}' contains a concept key and will never match on its own.",
                key
            );
        }
        Ok(())
    }

    /// Concept keys whose normalized form contains an earlier concept key.
    /// The substring scan always stops at the earlier key, so these never self-match.
    pub fn shadowed_concept_keys(&self) -> Vec<&str> {
        let normalized: Vec<String> = self.concepts.iter().map(|c| normalize(&c.key)).collect();
        self.concepts
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                normalized[..*idx]
                    .iter()
                    .any(|earlier| normalized[*idx].contains(earlier.as_str()))
            })
            .map(|(_, entry)| entry.key.as_str())
            .collect()
    }

    /// Service keys whose normalized form contains a concept key. Concepts are
    /// scanned before services, so these never self-match either.
    pub fn shadowed_service_keys(&self) -> Vec<&str> {
        let concept_keys: Vec<String> = self.concepts.iter().map(|c| normalize(&c.key)).collect();
        self.services
            .iter()
            .filter(|service| {
                let key = normalize(&service.key);
                concept_keys.iter().any(|concept| key.contains(concept.as_str()))
            })
            .map(|service| service.key.as_str())
            .collect()
    }

    /// Looks up a concept by key. An exact key wins; otherwise a key written
    /// with `_` for spaces is accepted.
    pub fn concept(&self, key: &str) -> Option<&ConceptEntry> {
        self.concepts
            .iter()
            .find(|c| c.key == key)
            .or_else(|| self.concepts.iter().find(|c| c.key.replace('_', " ") == key))
    }

    pub fn service(&self, key: &str) -> Option<&ServiceEntry> {
        self.services.iter().find(|s| s.key == key)
    }

    pub fn faq(&self, question: &str) -> Option<&FaqEntry> {
        self.faqs.iter().find(|f| f.question == question)
    }

    /// # Built-in Catalogue (`builtin`)
    ///
    /// The WeCredit catalogue shipped with the binary. Entries are ordered so
    /// that every key self-matches and every FAQ question matches its own entry.
    pub fn builtin() -> Self {
        Self {
            concepts: builtin_concepts(),
            services: builtin_services(),
            faqs: builtin_faqs(),
            intents: builtin_intents(),
        }
    }
}

fn ensure_unique<'a>(
    table: &str,
    keys: impl Iterator<Item = &'a str>,
) -> std::result::Result<(), WecreditError> {
    let mut seen = HashSet::new();
    for key in keys {
        if normalize(key).is_empty() {
            return Err(WecreditError::KnowledgeBase(format!(
                "Empty {} key '{}' (no letters or digits).",
                table, key
            )));
        }
        if !seen.insert(key) {
            return Err(WecreditError::KnowledgeBase(format!(
                "Duplicate {} key '{}'.",
                table, key
            )));
        }
    }
    Ok(())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn concept(key: &str, definition: &str) -> ConceptEntry {
    ConceptEntry {
        key: key.to_string(),
        title: None,
        definition: definition.to_string(),
        types: Vec::new(),
        range: None,
        providers: Vec::new(),
        factors: Vec::new(),
        documentation: Vec::new(),
        calculation: None,
        key_terms: Vec::new(),
        suggestions: Vec::new(),
    }
}

fn builtin_concepts() -> Vec<ConceptEntry> {
    vec![
        ConceptEntry {
            types: strings(&["Personal Loan", "Home Loan", "Business Loan", "Education Loan"]),
            documentation: strings(&[
                "PAN card",
                "Aadhaar card",
                "Bank statements for the last 3 months",
                "Income proof (salary slips or ITR)",
            ]),
            key_terms: strings(&["EMI", "Interest Rate", "Tenure", "Principal Amount"]),
            suggestions: strings(&["Tell me about interest rates", "What is EMI"]),
            ..concept(
                "loan",
                "A sum of money borrowed that is expected to be paid back with interest",
            )
        },
        ConceptEntry {
            title: Some("CIBIL Score".to_string()),
            range: Some("300-900".to_string()),
            factors: strings(&[
                "Repayment track record",
                "Credit utilisation ratio",
                "Number of recent credit enquiries",
                "Mix of secured and unsecured credit",
            ]),
            suggestions: strings(&["How to improve credit score", "Apply for loan"]),
            ..concept(
                "cibil",
                "A three-digit credit score issued by TransUnion CIBIL that summarises your repayment history; 750 and above is considered good",
            )
        },
        ConceptEntry {
            range: Some("300-900".to_string()),
            providers: strings(&["CIBIL", "Experian", "Equifax", "CRIF High Mark"]),
            factors: strings(&[
                "Payment History",
                "Credit Utilization",
                "Credit Age",
                "Credit Mix",
            ]),
            suggestions: strings(&["How to improve credit score", "Apply for loan"]),
            ..concept(
                "credit score",
                "A numerical expression of creditworthiness based on credit history",
            )
        },
        ConceptEntry {
            types: strings(&["Fixed Rate", "Floating Rate", "Base Rate", "MCLR"]),
            factors: strings(&[
                "RBI Policy",
                "Credit Score",
                "Market Conditions",
                "Loan Type",
            ]),
            suggestions: strings(&["What is EMI", "Compare loan options"]),
            ..concept(
                "interest rate",
                "The percentage of principal charged by lender for loan use",
            )
        },
        ConceptEntry {
            title: Some("EMI".to_string()),
            calculation: Some(
                "EMI = P x R x (1+R)^N / ((1+R)^N - 1), where P is the principal, R the monthly interest rate and N the number of monthly instalments"
                    .to_string(),
            ),
            suggestions: strings(&["Tell me about interest rates", "What is tenure"]),
            ..concept(
                "emi",
                "Equated Monthly Instalment, the fixed amount paid to the lender every month until the loan is repaid",
            )
        },
        ConceptEntry {
            types: strings(&["Property", "Gold", "Fixed Deposits", "Shares and Mutual Funds"]),
            suggestions: strings(&["What types of loans are there", "Apply for loan"]),
            ..concept(
                "collateral",
                "An asset pledged to a lender as security for repayment of a loan",
            )
        },
        ConceptEntry {
            factors: strings(&["Loan Amount", "Monthly Income", "Age", "Lender Policy"]),
            suggestions: strings(&["What is EMI", "Apply for loan"]),
            ..concept(
                "tenure",
                "The period over which a loan is to be repaid, usually quoted in months",
            )
        },
    ]
}

fn attributes(pairs: &[(&str, &str)]) -> Vec<ServiceAttribute> {
    pairs
        .iter()
        .map(|(name, value)| ServiceAttribute {
            name: name.to_string(),
            value: value.to_string(),
        })
        .collect()
}

fn builtin_services() -> Vec<ServiceEntry> {
    vec![
        ServiceEntry {
            key: "credit line".to_string(),
            title: None,
            attributes: attributes(&[
                ("interest_rate", "1.25% - 3% per month"),
                ("credit_limit", "Up to ₹5,00,000"),
                ("processing_fee", "Up to 2% of the sanctioned limit"),
                ("tenure", "3 to 36 months"),
                ("disbursal_time", "Within 24 hours of approval"),
            ]),
            suggestions: Vec::new(),
        },
        ServiceEntry {
            key: "salary advance".to_string(),
            title: None,
            attributes: attributes(&[
                ("interest_rate", "1.5% per month"),
                ("amount", "Up to 50% of monthly salary"),
                ("tenure", "Up to 3 months"),
                ("eligibility", "Salaried, at least 6 months with current employer"),
            ]),
            suggestions: Vec::new(),
        },
        ServiceEntry {
            key: "pay later".to_string(),
            title: None,
            attributes: attributes(&[
                ("credit_limit", "Up to ₹50,000"),
                ("interest_free_period", "Up to 30 days"),
                ("late_fee", "₹500 or 3% of the overdue amount, whichever is higher"),
            ]),
            suggestions: Vec::new(),
        },
    ]
}

fn faq(question: &str, answer: &str) -> FaqEntry {
    FaqEntry {
        question: question.to_string(),
        answer: answer.to_string(),
        suggestions: Vec::new(),
    }
}

fn builtin_faqs() -> Vec<FaqEntry> {
    vec![
        faq(
            "how do i check my eligibility",
            "You can check your eligibility in under two minutes in the WeCredit app. Enter your PAN, monthly income and employment details to see pre-approved offers from our lending partners. Checking does not affect your credit score.",
        ),
        faq(
            "what documents are required to apply",
            "Most applications need a PAN card, an Aadhaar card for address proof, and your last three months of bank statements or salary slips. Self-employed applicants also need their latest ITR.",
        ),
        faq(
            "how long does approval take",
            "Most applications are approved within minutes, and funds are usually disbursed within 24 hours of approval.",
        ),
        faq(
            "is my personal data safe with wecredit",
            "Yes. Your data is encrypted in transit and at rest, and it is shared only with the lending partner you choose to apply with.",
        ),
        faq(
            "where can i get customer support",
            "Open the Help section in the WeCredit app to chat with our support team, or request a call back and an advisor will contact you within one working day.",
        ),
        faq(
            "are there charges for early repayment",
            "Foreclosure charges depend on the lending partner. Many of our partners allow early repayment with no charges after the first six instalments; the exact terms are shown before you accept an offer.",
        ),
    ]
}

fn builtin_intents() -> Vec<IntentPhrases> {
    vec![
        IntentPhrases {
            intent: Intent::LoanTypes,
            phrases: strings(&["what types of loans", "loan options", "different loans"]),
        },
        IntentPhrases {
            intent: Intent::CreditScoreInfo,
            phrases: strings(&["what is credit score", "cibil score", "credit rating"]),
        },
        IntentPhrases {
            intent: Intent::InterestRates,
            phrases: strings(&["interest rates", "rate of interest", "how much interest"]),
        },
    ]
}
