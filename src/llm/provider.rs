// ABOUTME: Environment-driven LLM provider selection for recipe generation
// ABOUTME: Wraps concrete providers in an enum so callers stay provider-agnostic
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

//! Provider selection front-end.
//!
//! `ChatProvider` picks the configured backend at startup and delegates
//! all completion calls to it. Deployments choose the backend with the
//! `LLM_PROVIDER` environment variable.

use std::fmt;

use async_trait::async_trait;
use tracing::info;

use crate::config::{LlmConfig, LlmProviderType};
use crate::errors::AppError;
use crate::llm::openai::{OpenAiConfig, OpenAiProvider};
use crate::llm::{ChatRequest, ChatResponse, LlmCapabilities, LlmProvider};

/// Chat completion provider selected from server configuration
pub enum ChatProvider {
    /// Hosted OpenAI API
    OpenAi(OpenAiProvider),
    /// Self-hosted OpenAI-compatible endpoint
    Custom(OpenAiProvider),
}

impl ChatProvider {
    /// Create the provider selected by server configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be constructed, for
    /// example when a custom endpoint is selected without a base URL.
    pub fn from_config(config: &LlmConfig) -> Result<Self, AppError> {
        info!(
            "Initializing LLM provider: {} (set {} to change)",
            config.provider,
            LlmProviderType::ENV_VAR
        );

        match config.provider {
            LlmProviderType::OpenAi => {
                let provider = OpenAiProvider::new(OpenAiConfig::openai(
                    config.api_key.clone(),
                    config.model.clone(),
                ))?;
                Ok(Self::OpenAi(provider))
            }
            LlmProviderType::Custom => {
                let base_url = config.base_url.clone().ok_or_else(|| {
                    AppError::config(format!(
                        "Custom LLM provider requires {} to be set",
                        LlmProviderType::BASE_URL_ENV_VAR
                    ))
                })?;
                let provider = OpenAiProvider::new(OpenAiConfig::custom(
                    config.api_key.clone(),
                    base_url,
                    config.model.clone(),
                ))?;
                Ok(Self::Custom(provider))
            }
        }
    }

    /// Provider type selected by configuration
    #[must_use]
    pub const fn provider_type(&self) -> LlmProviderType {
        match self {
            Self::OpenAi(_) => LlmProviderType::OpenAi,
            Self::Custom(_) => LlmProviderType::Custom,
        }
    }

    const fn inner(&self) -> &OpenAiProvider {
        match self {
            Self::OpenAi(provider) | Self::Custom(provider) => provider,
        }
    }
}

impl fmt::Debug for ChatProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi(_) => f.debug_tuple("OpenAi").finish(),
            Self::Custom(_) => f.debug_tuple("Custom").finish(),
        }
    }
}

#[async_trait]
impl LlmProvider for ChatProvider {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn display_name(&self) -> &'static str {
        self.inner().display_name()
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.inner().capabilities()
    }

    fn default_model(&self) -> &str {
        self.inner().default_model()
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.inner().complete(request).await
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        self.inner().health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;

    fn base_config() -> LlmConfig {
        LlmConfig {
            provider: LlmProviderType::OpenAi,
            api_key: Some("test-key".to_owned()),
            base_url: None,
            model: "gpt-4o-mini".to_owned(),
            max_tokens: 2000,
            temperature: 0.7,
        }
    }

    #[test]
    fn test_openai_provider_selection() {
        let provider = ChatProvider::from_config(&base_config()).unwrap();
        assert_eq!(provider.provider_type(), LlmProviderType::OpenAi);
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.default_model(), "gpt-4o-mini");
    }

    #[test]
    fn test_custom_provider_requires_base_url() {
        let mut config = base_config();
        config.provider = LlmProviderType::Custom;
        assert!(ChatProvider::from_config(&config).is_err());

        config.base_url = Some("http://localhost:11434/v1".to_owned());
        let provider = ChatProvider::from_config(&config).unwrap();
        assert_eq!(provider.provider_type(), LlmProviderType::Custom);
        assert_eq!(provider.name(), "custom");
    }
}
