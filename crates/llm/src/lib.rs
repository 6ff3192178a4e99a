//! VibeInvite LLM provider infrastructure adapter.
//!
//! Implements the [`pipeline::LlmProvider`] trait for any OpenAI-compatible
//! chat-completions endpoint. Model name, API key and base URL are supplied
//! by the composition root; nothing here reads the environment.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting, timeouts and
//! response parsing live here. The `nodes` crate sees only
//! [`pipeline::LlmProvider`].

pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{CompletionRequest, LlmError, LlmProvider, ResponseFormat};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use types::{ChatMessage, ChatRequest, ChatResponse, ResponseFormatBody};

/// Base URL used when none is configured.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o";
/// Upper bound on one completion call, body included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors raised while constructing a provider.
#[derive(Debug, Error)]
pub enum ProviderConfigError {
    #[error("missing API key")]
    MissingApiKey,

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Connection settings for the chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Sent as a bearer token.
    pub api_key: String,
    pub model: String,
    /// Base URL without the `/chat/completions` suffix.
    pub api_base: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Settings with the default model, base URL and timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            api_base: DEFAULT_API_BASE.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Provider for OpenAI-compatible chat-completions APIs.
#[derive(Debug)]
pub struct OpenAiProvider {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderConfigError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderConfigError::MissingApiKey);
        }
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Model name sent with every request.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }

    fn body(&self, request: CompletionRequest) -> ChatRequest {
        let response_format = match request.response_format {
            ResponseFormat::JsonObject => Some(ResponseFormatBody {
                kind: "json_object",
            }),
            ResponseFormat::Text => None,
        };
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(request.system),
                ChatMessage::user(request.user),
            ],
            temperature: request.temperature,
            response_format,
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout {
                seconds: self.config.timeout.as_secs(),
            }
        } else {
            LlmError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let body = self.body(request);
        debug!(model = %body.model, json = body.response_format.is_some(), "sending completion request");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "(no body)".into());
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.transport_error(e)
                } else {
                    LlmError::InvalidResponse(format!("failed to parse response: {e}"))
                }
            })?;

        parsed
            .text()
            .map(str::to_string)
            .ok_or_else(|| LlmError::InvalidResponse("response has no content".into()))
    }
}
