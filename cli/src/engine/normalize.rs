//! # Query Normalizer
//!
//! File: cli/src/engine/normalize.rs
//!
//! Turns raw user input into the canonical form every matcher works on:
//! lower-cased, stripped of every character other than letters, digits,
//! whitespace and the punctuation in [`KEPT_PUNCTUATION`], and trimmed.
//!
//! Normalization is total: every string, including the empty one, has a
//! normalized form, so there is no error path here.

/// Punctuation that survives normalization.
pub const KEPT_PUNCTUATION: [char; 3] = ['.', ',', '?'];

/// # Normalize Query (`normalize`)
///
/// Lower-cases `raw`, drops disallowed characters, then trims surrounding
/// whitespace. Filtering happens before trimming so that stripped trailing
/// punctuation cannot leave whitespace behind, which keeps the function
/// idempotent.
pub fn normalize(raw: &str) -> String {
    let filtered: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || KEPT_PUNCTUATION.contains(c))
        .collect();
    filtered.trim().to_string()
}
