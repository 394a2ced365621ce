//! # WeCredit Filesystem I/O Operations
//!
//! File: cli/src/common/fs/io.rs
//!
//! ## Overview
//!
//! Small wrappers around `std::fs` that add consistent error context:
//! - **`ensure_dir_exists`**: creates a directory (and parents) if missing, and
//!   rejects a path that exists but is not a directory.
//! - **`append_line`**: appends one line to a file, creating the file and its
//!   parent directories on first use. Used by the transcript log.
//!
//! ```text
//! io::ensure_dir_exists(Path::new("./logs"))?;
//! io::append_line(Path::new("./logs/chat.jsonl"), r#"{"user_input":"hi"}"#)?;
//! ```
//!
use crate::core::error::{Result, WecreditError};
use anyhow::Context;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Ensures that a directory exists at the specified path.
///
/// Missing directories are created recursively (like `mkdir -p`). If the path
/// already exists as something other than a directory, a
/// `WecreditError::Config` error is returned.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {:?}", path))?;
        info!("Created directory: {:?}", path);
    } else if !path.is_dir() {
        anyhow::bail!(WecreditError::Config(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    } else {
        debug!("Directory already exists: {:?}", path);
    }
    Ok(())
}

/// Appends `line` plus a trailing newline to the file at `path`.
///
/// The parent directory is created if needed and the file is opened in append
/// mode, so existing content is never rewritten.
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    // An empty parent means a bare file name in the current directory.
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir_exists(parent)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {:?} for appending", path))?;
    writeln!(file, "{}", line).with_context(|| format!("Failed to append to file {:?}", path))?;
    debug!("Appended {} bytes to {:?}", line.len() + 1, path);
    Ok(())
}
