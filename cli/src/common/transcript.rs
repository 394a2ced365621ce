//! # Conversation Transcript
//!
//! File: cli/src/common/transcript.rs
//!
//! Append-only JSON-lines log of answered queries. Each line is one object:
//!
//! ```text
//! {"timestamp":"2024-05-01T10:15:42.123456","user_input":"what is emi","response":"EMI: ..."}
//! ```
//!
//! The assistant never reads the file back. Recording is best-effort: a failed
//! write is logged and the conversation carries on.
//!
use crate::common::fs::io;
use crate::core::error::Result;
use anyhow::Context;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// One transcript line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub timestamp: String,
    pub user_input: String,
    pub response: String,
}

impl TranscriptEntry {
    /// Stamps an exchange with the current local time (ISO-8601, microseconds).
    pub fn now(user_input: &str, response: &str) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            user_input: user_input.to_string(),
            response: response.to_string(),
        }
    }
}

/// Writer for a transcript file.
#[derive(Debug, Clone)]
pub struct Transcript {
    path: PathBuf,
}

impl Transcript {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry, propagating any serialization or I/O failure.
    pub fn append(&self, entry: &TranscriptEntry) -> Result<()> {
        let line = serde_json::to_string(entry).context("Failed to serialize transcript entry")?;
        io::append_line(&self.path, &line)
    }

    /// Records an exchange, logging instead of failing.
    pub fn record(&self, user_input: &str, response: &str) {
        if let Err(e) = self.append(&TranscriptEntry::now(user_input, response)) {
            warn!(
                "Could not write transcript entry to {}: {:#}",
                self.path.display(),
                e
            );
        }
    }
}
