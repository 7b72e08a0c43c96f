// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, deployment modes, and runtime configuration parsing
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Environment-based configuration management for production deployment

use crate::config::types::{Environment, LlmProviderType, LogLevel};
use crate::constants::{env_config, limits};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Type-safe database location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// SQLite database with file path
    SQLite {
        /// Path to the database file
        path: PathBuf,
    },
    /// In-memory SQLite (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    #[must_use]
    pub fn parse_url(s: &str) -> Self {
        if let Some(path_str) = s.strip_prefix("sqlite:") {
            if path_str == ":memory:" {
                Self::Memory
            } else {
                Self::SQLite {
                    path: PathBuf::from(path_str),
                }
            }
        } else {
            // Fallback: treat as SQLite file path
            Self::SQLite {
                path: PathBuf::from(s),
            }
        }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/savora.db"),
        }
    }
}

impl std::fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Log level
    pub log_level: LogLevel,
    /// Deployment environment
    pub environment: Environment,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// CORS settings
    pub cors: CorsConfig,
    /// Rate limiting configuration
    pub rate_limits: RateLimitsConfig,
    /// LLM provider configuration
    pub llm: LlmConfig,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite path or in-memory)
    pub url: DatabaseUrl,
    /// Run migrations on startup
    pub auto_migrate: bool,
}

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT signing secret; generated and persisted when absent
    pub jwt_secret: Option<String>,
    /// JWT expiry time in hours
    pub jwt_expiry_hours: i64,
}

/// CORS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; `["*"]` permits any origin
    pub allowed_origins: Vec<String>,
}

/// Fixed-window rate limit settings for one class of requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Attempts allowed inside one window
    pub max_attempts: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

/// Rate limit settings per request class
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitsConfig {
    /// Master switch; disabling skips all limiter checks
    pub enabled: bool,
    /// Login and registration attempts, keyed by email
    pub auth: RateLimitConfig,
    /// Recipe generation requests, keyed by user
    pub generation: RateLimitConfig,
}

/// LLM provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Which provider implementation to use
    pub provider: LlmProviderType,
    /// API key for the provider
    pub api_key: Option<String>,
    /// Custom API base URL, when the provider default does not apply
    pub base_url: Option<String>,
    /// Model identifier
    pub model: String,
    /// Completion token budget per generation
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable holds a value that cannot
    /// be parsed, or if the resulting configuration fails validation.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let config = Self {
            http_port: env_config::http_port(),
            log_level: LogLevel::from_str_or_default(&env_config::log_level()),
            environment: Environment::from_str_or_default(&env_config::environment()),

            database: DatabaseConfig {
                url: DatabaseUrl::parse_url(&env_config::database_url()),
                auto_migrate: env_var_or("AUTO_MIGRATE", "true")?
                    .parse()
                    .context("Invalid AUTO_MIGRATE value")?,
            },

            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
                jwt_expiry_hours: env_config::jwt_expiry_hours(),
            },

            cors: CorsConfig {
                allowed_origins: parse_origins(&env_config::cors_allowed_origins()),
            },

            rate_limits: RateLimitsConfig {
                enabled: env_var_or("RATE_LIMIT_ENABLED", "true")?
                    .parse()
                    .context("Invalid RATE_LIMIT_ENABLED value")?,
                auth: RateLimitConfig {
                    max_attempts: env_var_or(
                        "AUTH_RATE_LIMIT_MAX_ATTEMPTS",
                        &limits::DEFAULT_RATE_LIMIT_ATTEMPTS.to_string(),
                    )?
                    .parse()
                    .context("Invalid AUTH_RATE_LIMIT_MAX_ATTEMPTS value")?,
                    window_secs: env_var_or(
                        "AUTH_RATE_LIMIT_WINDOW_SECS",
                        &limits::DEFAULT_RATE_LIMIT_WINDOW_SECS.to_string(),
                    )?
                    .parse()
                    .context("Invalid AUTH_RATE_LIMIT_WINDOW_SECS value")?,
                },
                generation: RateLimitConfig {
                    max_attempts: env_var_or(
                        "GENERATION_RATE_LIMIT_MAX_ATTEMPTS",
                        &limits::DEFAULT_RATE_LIMIT_ATTEMPTS.to_string(),
                    )?
                    .parse()
                    .context("Invalid GENERATION_RATE_LIMIT_MAX_ATTEMPTS value")?,
                    window_secs: env_var_or(
                        "GENERATION_RATE_LIMIT_WINDOW_SECS",
                        &limits::DEFAULT_RATE_LIMIT_WINDOW_SECS.to_string(),
                    )?
                    .parse()
                    .context("Invalid GENERATION_RATE_LIMIT_WINDOW_SECS value")?,
                },
            },

            llm: LlmConfig {
                provider: LlmProviderType::from_env(),
                api_key: env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty()),
                base_url: LlmProviderType::base_url_from_env(),
                model: LlmProviderType::model_from_env(),
                max_tokens: env_var_or(
                    "LLM_MAX_TOKENS",
                    &limits::DEFAULT_LLM_MAX_TOKENS.to_string(),
                )?
                .parse()
                .context("Invalid LLM_MAX_TOKENS value")?,
                temperature: env_var_or(
                    "LLM_TEMPERATURE",
                    &limits::DEFAULT_LLM_TEMPERATURE.to_string(),
                )?
                .parse()
                .context("Invalid LLM_TEMPERATURE value")?,
            },
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error when a value is outside its accepted range.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.is_none() {
            warn!("OPENAI_API_KEY is not set; recipe generation requests will fail");
        }

        if self.llm.provider == LlmProviderType::Custom && self.llm.base_url.is_none() {
            return Err(anyhow::anyhow!(
                "LLM_BASE_URL must be set when LLM_PROVIDER is custom"
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(anyhow::anyhow!(
                "LLM_TEMPERATURE must be between 0.0 and 2.0"
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(anyhow::anyhow!("LLM_MAX_TOKENS must be greater than zero"));
        }

        if self.rate_limits.auth.max_attempts == 0 || self.rate_limits.generation.max_attempts == 0
        {
            return Err(anyhow::anyhow!("Rate limit attempts must be at least 1"));
        }

        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Savora Server Configuration:\n\
             - HTTP Port: {}\n\
             - Environment: {}\n\
             - Log Level: {}\n\
             - Database: {}\n\
             - JWT Expiry: {}h\n\
             - CORS Origins: {}\n\
             - Rate Limiting: {}\n\
             - Auth Rate Limit: {}/{}s\n\
             - Generation Rate Limit: {}/{}s\n\
             - LLM Provider: {} (model: {})",
            self.http_port,
            self.environment,
            self.log_level,
            self.database.url,
            self.auth.jwt_expiry_hours,
            self.cors.allowed_origins.join(", "),
            if self.rate_limits.enabled {
                "enabled"
            } else {
                "disabled"
            },
            self.rate_limits.auth.max_attempts,
            self.rate_limits.auth.window_secs,
            self.rate_limits.generation.max_attempts,
            self.rate_limits.generation.window_secs,
            self.llm.provider,
            self.llm.model,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> Result<String> {
    Ok(env::var(key).unwrap_or_else(|_| default.to_owned()))
}

/// Parse comma-separated CORS origins
fn parse_origins(origins_str: &str) -> Vec<String> {
    if origins_str == "*" {
        vec!["*".to_owned()]
    } else {
        origins_str
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            http_port: 8081,
            log_level: LogLevel::default(),
            environment: Environment::Testing,
            database: DatabaseConfig {
                url: DatabaseUrl::Memory,
                auto_migrate: true,
            },
            auth: AuthConfig {
                jwt_secret: None,
                jwt_expiry_hours: limits::JWT_EXPIRY_HOURS,
            },
            cors: CorsConfig {
                allowed_origins: vec!["*".to_owned()],
            },
            rate_limits: RateLimitsConfig {
                enabled: true,
                auth: RateLimitConfig {
                    max_attempts: limits::DEFAULT_RATE_LIMIT_ATTEMPTS,
                    window_secs: limits::DEFAULT_RATE_LIMIT_WINDOW_SECS,
                },
                generation: RateLimitConfig {
                    max_attempts: limits::DEFAULT_RATE_LIMIT_ATTEMPTS,
                    window_secs: limits::DEFAULT_RATE_LIMIT_WINDOW_SECS,
                },
            },
            llm: LlmConfig {
                provider: LlmProviderType::OpenAi,
                api_key: Some("test-key".to_owned()),
                base_url: None,
                model: LlmProviderType::DEFAULT_MODEL.to_owned(),
                max_tokens: limits::DEFAULT_LLM_MAX_TOKENS,
                temperature: limits::DEFAULT_LLM_TEMPERATURE,
            },
        }
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(
            parse_origins("http://localhost:3000,https://app.example.com"),
            vec!["http://localhost:3000", "https://app.example.com"]
        );
    }

    #[test]
    fn test_database_url_parsing() {
        let sqlite_url = DatabaseUrl::parse_url("sqlite:./test.db");
        assert!(!sqlite_url.is_memory());
        assert_eq!(sqlite_url.to_connection_string(), "sqlite:./test.db");

        let memory_url = DatabaseUrl::parse_url("sqlite::memory:");
        assert!(memory_url.is_memory());

        // Bare paths fall back to SQLite
        let fallback_url = DatabaseUrl::parse_url("./some/path.db");
        assert_eq!(fallback_url.to_connection_string(), "sqlite:./some/path.db");
    }

    #[test]
    fn test_config_validation() {
        let mut config = test_config();
        assert!(config.validate().is_ok());

        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());

        config.llm.temperature = 0.7;
        config.llm.provider = LlmProviderType::Custom;
        assert!(config.validate().is_err());

        config.llm.base_url = Some("http://localhost:11434/v1".to_owned());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_summary_omits_secrets() {
        let config = test_config();
        let summary = config.summary();
        assert!(summary.contains("HTTP Port: 8081"));
        assert!(!summary.contains("test-key"));
    }
}
