//! # WeCredit Filesystem Utilities
//!
//! File: cli/src/common/fs/mod.rs
//!
//! Filesystem helpers shared across commands. Import from the submodule,
//! e.g. `use crate::common::fs::io::append_line;`.

/// Basic file I/O operations (`ensure_dir_exists`, `append_line`).
pub mod io;
