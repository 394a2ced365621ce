//! # WeCredit HTTP Service
//!
//! File: cli/src/commands/serve/mod.rs
//!
//! ## Overview
//!
//! `wecredit serve` exposes the answer engine as a small JSON service for web
//! front ends that render the reply text and its suggestions as buttons.
//!
//! ```text
//! POST /api/chat     {"message": "what is emi"}  -> {"text": "...", "suggestions": [...], "error": null}
//! GET  /api/topics                                -> {"concepts": [...], "services": [...], "faqs": [...]}
//! GET  /health                                    -> ok
//! ```
//!
//! Requests are independent: no conversation state is kept between them.
//!
//! ## Examples
//!
//! ```bash
//! # Defaults from config ([server] table), falling back to 127.0.0.1:8000
//! wecredit serve
//!
//! # All interfaces, another port, no CORS headers, fallback disabled
//! wecredit serve --host 0.0.0.0 --port 9000 --no-cors --no-fallback
//! ```
//!
use super::engine_args::{build_engine, EngineArgs};
use crate::core::config::ServerSettings;
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use std::net::IpAddr;
use tracing::info;

/// Axum router, handlers and the listen loop.
pub mod server_logic;

/// # Serve Arguments (`ServeArgs`)
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to. Defaults to `[server] host` from config (127.0.0.1).
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to listen on. Defaults to `[server] port` from config (8000).
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Do not send CORS headers.
    #[arg(long)]
    pub no_cors: bool,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Final listen settings after merging flags over the `[server]` table.
#[derive(Debug, Clone, PartialEq)]
pub struct ServeConfig {
    pub host: IpAddr,
    pub port: u16,
    pub enable_cors: bool,
}

impl ServeConfig {
    pub fn resolve(args: &ServeArgs, settings: &ServerSettings) -> Result<Self> {
        let host = match args.host {
            Some(host) => host,
            None => settings
                .host
                .parse()
                .with_context(|| format!("Invalid server host '{}'", settings.host))?,
        };
        Ok(Self {
            host,
            port: args.port.unwrap_or(settings.port),
            enable_cors: settings.enable_cors && !args.no_cors,
        })
    }
}

/// # Handle Serve Command (`handle_serve`)
///
/// Builds the engine, resolves the listen settings and runs the server until
/// Ctrl+C or SIGTERM.
pub async fn handle_serve(args: ServeArgs) -> Result<()> {
    info!("Handling serve command with args: {:?}", args);

    let engine = build_engine(&args.engine)?;
    let serve_config = ServeConfig::resolve(&args, &engine.config.server)?;
    info!("Effective server config: {:?}", serve_config);

    server_logic::run_server(serve_config, engine).await
}
