//! # WeCredit HTTP Server Implementation
//!
//! File: cli/src/commands/serve/server_logic.rs
//!
//! ## Overview
//!
//! Axum router and listen loop for `wecredit serve`:
//! - JSON chat endpoint backed by the shared `ChatBot`
//! - topic listing and a health probe
//! - port availability checking with automatic fallback
//! - CORS and request tracing middleware
//! - graceful shutdown on Ctrl+C or SIGTERM
//!
//! ## Architecture
//!
//! 1. Find an available port, starting from the requested one
//! 2. Build the router around an `Arc<AppState>`
//! 3. Serve until a shutdown signal arrives
//!
use super::ServeConfig;
use crate::commands::engine_args::Engine;
use crate::commands::topics::TopicIndex;
use crate::common::transcript::Transcript;
use crate::core::error::Result;
use crate::engine::formatter::ChatResponse;
use crate::engine::ChatBot;
use anyhow::Context;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, error, info, warn, Level};

const MAX_PORT_ATTEMPTS: u8 = 10;

/// Shared, read-only state of the running service.
pub struct AppState {
    pub bot: ChatBot,
    pub transcript: Option<Transcript>,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Extra text forwarded to the fallback service, if it is used.
    #[serde(default)]
    pub context: Option<String>,
}

/// # Run HTTP Server (`run_server`)
///
/// Binds to the first free port at or after `config.port` and serves the chat
/// API until shutdown.
///
/// ## Errors
///
/// Fails when no port in range is free, when binding fails, or when the server
/// stops with an error.
pub async fn run_server(config: ServeConfig, engine: Engine) -> Result<()> {
    let addr = find_available_port(config.host, config.port, MAX_PORT_ATTEMPTS).await?;

    let state = Arc::new(AppState {
        bot: engine.bot,
        transcript: engine.transcript,
    });
    let app = create_app(state, config.enable_cors);

    println!("\n=================================================================");
    println!("💬 WeCredit assistant API");
    println!("🌐 Local URL:         http://{}", addr);
    println!("📮 Chat endpoint:     POST http://{}/api/chat", addr);
    println!("🔒 CORS enabled:      {}", config.enable_cors);
    println!("=================================================================\n");

    info!("Starting WeCredit API server on {}", addr);
    println!("Server starting! Press Ctrl+C to stop.");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind TCP listener to address {}", addr))?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    println!("\nServer shutdown complete.");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown..."),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
            Err(e) => {
                error!(
                    "Failed to install SIGTERM handler: {}. Shutdown on SIGTERM might not work.",
                    e
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// # Find Available Port (`find_available_port`)
///
/// Tries `start_port` and the following ports, up to `max_attempts` in total,
/// returning the first address that can be bound.
async fn find_available_port(
    req_host: std::net::IpAddr,
    start_port: u16,
    max_attempts: u8,
) -> Result<SocketAddr> {
    let mut current_port = start_port;

    for attempt in 0..max_attempts {
        let addr = SocketAddr::new(req_host, current_port);
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                drop(listener);
                if attempt > 0 {
                    info!(
                        "Port {} was unavailable, successfully bound to available port {}.",
                        start_port, current_port
                    );
                }
                return Ok(addr);
            }
            Err(e) => {
                warn!(
                    "Attempt {}: Port {} on host {} is unavailable (Error: {}). Trying next port...",
                    attempt + 1,
                    current_port,
                    req_host,
                    e
                );
                current_port = match current_port.checked_add(1) {
                    Some(next) => next,
                    None => break,
                };
            }
        }
    }

    anyhow::bail!(
        "Could not find an available port on host {} starting from port {} after trying {} ports.",
        req_host,
        start_port,
        max_attempts
    )
}

/// # Create Axum Application (`create_app`)
///
/// Routes plus tracing and (optionally permissive) CORS middleware.
pub fn create_app(state: Arc<AppState>, enable_cors: bool) -> Router {
    let cors_layer = if enable_cors {
        info!("CORS middleware enabled (permissive).");
        CorsLayer::permissive()
    } else {
        info!("CORS middleware disabled.");
        CorsLayer::new()
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::default().include_headers(true))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/topics", get(topics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(trace_layer).layer(cors_layer))
}

async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    debug!("Chat request: {:?}", request);
    let response = state
        .bot
        .respond(&request.message, request.context.as_deref())
        .await;
    if let Some(transcript) = &state.transcript {
        transcript.record(&request.message, &response.text);
    }
    Json(response)
}

async fn topics_handler(State(state): State<Arc<AppState>>) -> Json<TopicIndex> {
    Json(TopicIndex::from_store(state.bot.store()))
}

async fn health_handler() -> &'static str {
    "ok"
}
