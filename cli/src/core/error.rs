//! # WeCredit Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout the WeCredit assistant.
//! Two layers are in play:
//! - `WecreditError`: a `thiserror` enum for the failures the domain cares about
//!   (bad configuration, a broken knowledge base, an inconsistent match, a failed
//!   fallback call).
//! - `Result<T>`: an alias for `anyhow::Result<T>` used by command handlers and
//!   I/O code, where adding context matters more than matching on a variant.
//!
//! The two boundary operations of the pipeline (formatting a match and calling
//! the fallback service) return `std::result::Result<_, WecreditError>` so their
//! callers can substitute the fixed fallback text without unwinding.
//!
//! ## Examples
//!
//! ```text
//! // Surface a specific failure
//! return Err(WecreditError::Config("max_tokens must be greater than 0".into()))?;
//!
//! // Add context to I/O errors with anyhow
//! let raw = fs::read_to_string(&path)
//!     .with_context(|| format!("Failed to read knowledge base: {}", path.display()))?;
//! ```
//!
use thiserror::Error;

/// Custom error type for the WeCredit assistant.
#[derive(Error, Debug)]
pub enum WecreditError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    /// A match pointed at an entry that is missing or lacks a field its template needs.
    #[error("Knowledge base entry '{key}' is inconsistent: {detail}")]
    MatchInconsistency { key: String, detail: String },

    #[error("Fallback service error: {0}")]
    Delegate(String),

    #[error("Fallback service request failed: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_err = WecreditError::Config("temperature out of range".to_string());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: temperature out of range"
        );

        let inconsistent = WecreditError::MatchInconsistency {
            key: "credit score".into(),
            detail: "missing score range".into(),
        };
        assert_eq!(
            inconsistent.to_string(),
            "Knowledge base entry 'credit score' is inconsistent: missing score range"
        );

        let delegate = WecreditError::Delegate("no API credential configured".into());
        assert_eq!(
            delegate.to_string(),
            "Fallback service error: no API credential configured"
        );
    }
}
