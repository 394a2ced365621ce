//! # WeCredit Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! One module per top-level subcommand, each exposing an `*Args` struct and a
//! `handle_*` function that `main.rs` routes to.
//!
//! ## Commands
//!
//! - `chat`: interactive line-oriented session
//! - `ask`: one-shot question
//! - `serve`: HTTP JSON service
//! - `topics`: list the loaded knowledge tables
//!
//! `engine_args` holds the flags shared by `chat`, `ask` and `serve`, and the
//! code that turns them into a ready `ChatBot`.
//!

/// One-shot question answering.
pub mod ask;
/// Interactive chat session on stdin/stdout.
pub mod chat;
/// Shared engine flags and engine construction.
pub mod engine_args;
/// HTTP JSON service for web front ends.
pub mod serve;
/// Knowledge table listing.
pub mod topics;
