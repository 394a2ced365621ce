//! # WeCredit Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared utilities that are not part of the answer engine itself:
//!
//! - **`fs`**: filesystem helpers (`ensure_dir_exists`, `append_line`).
//! - **`transcript`**: the append-only JSON-lines conversation log written by
//!   `chat`, `ask` and `serve` when a log file is configured.
//!

/// Utilities for filesystem operations.
pub mod fs;
/// Append-only conversation log.
pub mod transcript;
