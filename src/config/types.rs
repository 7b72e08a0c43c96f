// ABOUTME: Core configuration type definitions for environment and logging settings
// ABOUTME: Contains LogLevel, Environment, and LlmProviderType enums used across config modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Strongly typed log level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level - only critical errors
    Error,
    /// Warning level - potential issues
    Warn,
    /// Info level - normal operational messages (default)
    #[default]
    Info,
    /// Debug level - detailed debugging information
    Debug,
    /// Trace level - very verbose tracing
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info, // Default fallback (including "info")
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Environment type for security and other configurations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment (default)
    #[default]
    Development,
    /// Production environment with stricter security
    Production,
    /// Testing environment for automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development, // Default fallback (including "development" | "dev")
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is a development environment
    #[must_use]
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a testing environment
    #[must_use]
    pub const fn is_testing(&self) -> bool {
        matches!(self, Self::Testing)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// LLM provider selection for recipe generation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// `OpenAI` chat completions API (default)
    #[default]
    OpenAi,
    /// Any `OpenAI`-compatible endpoint (Ollama, vLLM, `LocalAI`)
    Custom,
}

impl LlmProviderType {
    /// Environment variable name for LLM provider selection
    pub const ENV_VAR: &'static str = "LLM_PROVIDER";

    /// Environment variable for model selection
    pub const MODEL_ENV_VAR: &'static str = "LLM_MODEL";

    /// Environment variable for a custom API base URL
    pub const BASE_URL_ENV_VAR: &'static str = "LLM_BASE_URL";

    /// Default model used when none is configured
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    /// Parse from string with fallback to default
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "custom" | "local" | "ollama" | "vllm" | "localai" => Self::Custom,
            _ => Self::OpenAi, // Default fallback (including "openai")
        }
    }

    /// Load from environment variable
    #[must_use]
    pub fn from_env() -> Self {
        env::var(Self::ENV_VAR)
            .map(|s| Self::from_str_or_default(&s))
            .unwrap_or_default()
    }

    /// Get model from environment, falling back to the default model
    #[must_use]
    pub fn model_from_env() -> String {
        env::var(Self::MODEL_ENV_VAR)
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_MODEL.to_owned())
    }

    /// Get a custom base URL from environment
    ///
    /// Returns None when unset, in which case the provider default applies.
    #[must_use]
    pub fn base_url_from_env() -> Option<String> {
        env::var(Self::BASE_URL_ENV_VAR)
            .ok()
            .filter(|s| !s.is_empty())
    }
}

impl Display for LlmProviderType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str_or_default("error"), LogLevel::Error);
        assert_eq!(LogLevel::from_str_or_default("WARN"), LogLevel::Warn);
        assert_eq!(LogLevel::from_str_or_default("Debug"), LogLevel::Debug);
        assert_eq!(LogLevel::from_str_or_default("trace"), LogLevel::Trace);
        assert_eq!(LogLevel::from_str_or_default("invalid"), LogLevel::Info); // Default fallback
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str_or_default("production"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_or_default("PROD"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_or_default("test"),
            Environment::Testing
        );
        assert_eq!(
            Environment::from_str_or_default("invalid"),
            Environment::Development
        ); // Default fallback
    }

    #[test]
    fn test_llm_provider_parsing() {
        assert_eq!(
            LlmProviderType::from_str_or_default("openai"),
            LlmProviderType::OpenAi
        );
        assert_eq!(
            LlmProviderType::from_str_or_default("ollama"),
            LlmProviderType::Custom
        );
        assert_eq!(
            LlmProviderType::from_str_or_default("anything-else"),
            LlmProviderType::OpenAi
        );
    }
}
