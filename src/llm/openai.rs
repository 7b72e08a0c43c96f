// ABOUTME: OpenAI-compatible chat completion client used for recipe generation
// ABOUTME: Handles request serialization, auth headers, and API error mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

//! OpenAI-compatible provider implementation.
//!
//! Works against the official OpenAI API and against any self-hosted
//! endpoint that speaks the same chat completions wire format (Ollama,
//! vLLM, LocalAI).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::constants::timeouts;
use crate::errors::{AppError, ErrorCode};
use crate::llm::{ChatMessage, ChatRequest, ChatResponse, LlmCapabilities, LlmProvider, TokenUsage};

/// Default base URL for the hosted OpenAI API
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key, sent as a bearer token when present
    pub api_key: Option<String>,
    /// Base URL of the chat completions API
    pub base_url: String,
    /// Model used when a request does not name one
    pub default_model: String,
    /// Provider identifier reported by `LlmProvider::name`
    pub provider_name: &'static str,
    /// Human-readable name reported by `LlmProvider::display_name`
    pub display_name: &'static str,
}

impl OpenAiConfig {
    /// Configuration for the hosted OpenAI API
    #[must_use]
    pub fn openai(api_key: Option<String>, model: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_owned(),
            default_model: model,
            provider_name: "openai",
            display_name: "OpenAI",
        }
    }

    /// Configuration for a self-hosted OpenAI-compatible endpoint
    #[must_use]
    pub fn custom(api_key: Option<String>, base_url: String, model: String) -> Self {
        Self {
            api_key,
            base_url,
            default_model: model,
            provider_name: "custom",
            display_name: "Custom (OpenAI-compatible)",
        }
    }
}

/// Chat completion provider for OpenAI-compatible APIs
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    /// Create a new provider from endpoint configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: OpenAiConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(timeouts::LLM_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(timeouts::LLM_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn add_auth_header(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) if !key.is_empty() => request.bearer_auth(key),
            _ => request,
        }
    }

    /// Map a non-success API response to a structured error
    fn parse_error_response(&self, status: reqwest::StatusCode, body: &str) -> AppError {
        let api_message = serde_json::from_str::<ApiErrorResponse>(body)
            .map(|parsed| parsed.error.message)
            .unwrap_or_else(|_| body.chars().take(200).collect());

        match status.as_u16() {
            401 | 403 => AppError::new(
                ErrorCode::ExternalAuthFailed,
                format!("{} rejected the API key: {api_message}", self.config.display_name),
            ),
            429 => {
                let retry_hint = extract_retry_hint(&api_message)
                    .map_or_else(String::new, |secs| format!(" (retry in ~{secs}s)"));
                AppError::new(
                    ErrorCode::ExternalRateLimited,
                    format!("{} rate limit exceeded{retry_hint}", self.config.display_name),
                )
            }
            400 => AppError::new(
                ErrorCode::ExternalServiceError,
                format!("{} rejected the request: {api_message}", self.config.display_name),
            ),
            404 => AppError::new(
                ErrorCode::ExternalServiceError,
                format!(
                    "{} endpoint or model not found: {api_message}",
                    self.config.display_name
                ),
            ),
            502..=504 => AppError::new(
                ErrorCode::ExternalServiceUnavailable,
                format!("{} is unavailable: {api_message}", self.config.display_name),
            ),
            _ => AppError::external_service(
                self.config.display_name,
                format!("API error {status}: {api_message}"),
            ),
        }
    }
}

/// Extract a retry delay in whole seconds from an upstream rate limit message
///
/// OpenAI embeds hints like "Please try again in 1.2s" in 429 bodies.
fn extract_retry_hint(message: &str) -> Option<u64> {
    let start = message.find("try again in ")? + "try again in ".len();
    let rest = &message[start..];
    let end = rest.find('s')?;
    let seconds: f64 = rest[..end].trim().parse().ok()?;
    if seconds.is_finite() && seconds >= 0.0 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(seconds.ceil() as u64)
    } else {
        None
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        self.config.provider_name
    }

    fn display_name(&self) -> &'static str {
        self.config.display_name
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::JSON_MODE | LlmCapabilities::SYSTEM_MESSAGES
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(provider = self.config.provider_name))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone());

        let api_request = ApiRequest {
            model: model.clone(),
            messages: request.messages.iter().map(ApiMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(model = %model, messages = request.messages.len(), "Sending chat completion request");

        let response = self
            .add_auth_header(self.client.post(self.api_url("chat/completions")))
            .json(&api_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    AppError::new(
                        ErrorCode::ExternalServiceUnavailable,
                        format!("Cannot reach {}: {e}", self.config.display_name),
                    )
                } else {
                    AppError::external_service(self.config.display_name, e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_service(
                self.config.display_name,
                format!("Failed to read response body: {e}"),
            )
        })?;

        if !status.is_success() {
            warn!(status = %status, "Chat completion request failed");
            return Err(self.parse_error_response(status, &body));
        }

        let api_response: ApiResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::external_service(
                self.config.display_name,
                format!("Invalid completion response: {e}"),
            )
        })?;

        let choice = api_response.choices.into_iter().next().ok_or_else(|| {
            AppError::external_service(self.config.display_name, "Response contained no choices")
        })?;

        Ok(ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            model: api_response.model,
            usage: api_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    #[instrument(skip(self), fields(provider = self.config.provider_name))]
    async fn health_check(&self) -> Result<bool, AppError> {
        let response = self
            .add_auth_header(self.client.get(self.api_url("models")))
            .send()
            .await
            .map_err(|e| {
                AppError::new(
                    ErrorCode::ExternalServiceUnavailable,
                    format!("Cannot reach {}: {e}", self.config.display_name),
                )
            })?;

        Ok(response.status().is_success())
    }
}

// ============================================================================
// Wire Format
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

impl From<&ChatMessage> for ApiMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
