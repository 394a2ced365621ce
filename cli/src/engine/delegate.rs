//! # Fallback Delegate
//!
//! File: cli/src/engine/delegate.rs
//!
//! ## Overview
//!
//! When no knowledge-base entry matches, the query is forwarded to an external
//! generative-text service. The path is best-effort: one request, no retry, and
//! any failure collapses into the fixed [`APOLOGY`] text.
//!
//! ## Architecture
//!
//! - [`TextGenerator`]: the transport seam, an async trait so it can be held as
//!   `Arc<dyn TextGenerator>` and swapped for a stub in tests.
//! - [`OpenAiClient`]: `reqwest` implementation against an OpenAI-compatible
//!   `POST {api_base}/chat/completions` endpoint.
//! - [`FallbackDelegate`]: builds the role-tagged prompt with the configured
//!   model, output length and temperature, and owns the catch-all.
//!
use crate::core::config::DelegateConfig;
use crate::core::error::WecreditError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fixed role instruction sent ahead of every forwarded query.
pub const SYSTEM_INSTRUCTION: &str = "You are the WeCredit assistant, a helpful guide for Indian retail borrowers. \
Answer questions about loans, credit scores, interest rates and WeCredit's credit products briefly and accurately. \
If a question is unrelated to personal finance, politely steer the user back to financial topics.";

/// Returned in place of a reply whenever the external call fails.
pub const APOLOGY: &str = "I'm sorry, I couldn't answer that right now. Please try again later, or ask me about loans, credit scores, or interest rates.";

/// One role-tagged message of a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body of a chat-completions request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

/// # Text Generator (`TextGenerator`)
///
/// A single-shot text completion transport.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, WecreditError>;
}

/// Client for an OpenAI-compatible chat-completions API.
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &DelegateConfig) -> Result<Self, WecreditError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, WecreditError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| WecreditError::Delegate("no API credential configured".to_string()))?;

        debug!("Sending completion request to {}", self.endpoint);
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let body: CompletionResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| WecreditError::Delegate("response contained no choices".to_string()))
    }
}

/// # Fallback Delegate (`FallbackDelegate`)
///
/// Forwards unmatched queries to a [`TextGenerator`].
#[derive(Clone)]
pub struct FallbackDelegate {
    generator: Arc<dyn TextGenerator>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl FallbackDelegate {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &DelegateConfig) -> Self {
        Self {
            generator,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Builds the request: the fixed system instruction, then the query with
    /// any context appended.
    pub fn build_request(&self, query: &str, context: Option<&str>) -> CompletionRequest {
        let user_content = match context.map(str::trim).filter(|c| !c.is_empty()) {
            Some(context) => format!("{}\n\nContext: {}", query, context),
            None => query.to_string(),
        };
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_content,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Performs the call and returns the trimmed reply, or the failure.
    pub async fn try_delegate(
        &self,
        query: &str,
        context: Option<&str>,
    ) -> Result<String, WecreditError> {
        let request = self.build_request(query, context);
        let reply = self.generator.complete(&request).await?;
        Ok(reply.trim().to_string())
    }

    /// # Delegate (`delegate`)
    ///
    /// Like [`Self::try_delegate`], but never fails: any error is logged and
    /// replaced by [`APOLOGY`].
    pub async fn delegate(&self, query: &str, context: Option<&str>) -> String {
        match self.try_delegate(query, context).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Fallback service call failed: {}", e);
                APOLOGY.to_string()
            }
        }
    }
}
