//! # WeCredit Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! Foundational pieces shared by every command:
//! - `config`: layered TOML configuration (defaults, user file, project file)
//! - `error`: the `WecreditError` enum and the crate-wide `Result` alias
//!
//! ```text
//! use crate::core::config;
//! use crate::core::error::{Result, WecreditError};
//! ```
//!
pub mod config;
pub mod error;
