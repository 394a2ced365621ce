//! # WeCredit CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Every test gets a
//! command running in a fresh temporary directory, with the user config location
//! pointed at that directory and the fallback-service environment variables
//! cleared, so the developer's own setup never leaks into a test run.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A `wecredit` command plus the sandbox directory it runs in.
/// Keep the `TempDir` alive for as long as the command is used.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create sandbox dir");
        // Stops the `.wecredit.toml` search from walking above the sandbox.
        fs::create_dir(dir.path().join(".git")).expect("Failed to create sandbox .git dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// # Get WeCredit Command (`cmd`)
    ///
    /// `assert_cmd::Command` for the compiled `wecredit` binary, isolated in
    /// this sandbox.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("wecredit").expect("Failed to find wecredit binary for testing");
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env_remove("OPENAI_API_KEY")
            .env_remove("WECREDIT_MODEL")
            .env_remove("WECREDIT_API_BASE")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Writes `content` to `name` inside the sandbox and returns its path.
    pub fn write(&self, name: &str, content: &str) -> std::path::PathBuf {
        let path = self.path().join(name);
        fs::write(&path, content).expect("Failed to write sandbox file");
        path
    }
}

/// Shorthand for a one-off isolated command when no files are needed.
pub fn wecredit_cmd() -> (Sandbox, Command) {
    let sandbox = Sandbox::new();
    let cmd = sandbox.cmd();
    (sandbox, cmd)
}
