// ABOUTME: Test utilities for creating users, configuration, and server resources
// ABOUTME: Centralizes test fixtures to avoid duplication across unit and integration tests
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Savora Health

use std::sync::Arc;

use crate::auth::AuthManager;
use crate::config::{
    AuthConfig, CorsConfig, DatabaseConfig, DatabaseUrl, Environment, LlmConfig, LlmProviderType,
    LogLevel, RateLimitConfig, RateLimitsConfig, ServerConfig,
};
use crate::constants::limits;
use crate::database::Database;
use crate::errors::AppResult;
use crate::models::User;
use crate::server::ServerResources;

/// Create a test user with default values
#[must_use]
pub fn create_test_user(email: &str, display_name: Option<String>) -> User {
    User::new(
        email.to_owned(),
        "test_password_hash".to_owned(),
        display_name,
    )
}

/// Server configuration for tests: in-memory database, wildcard CORS,
/// default rate-limit windows
#[must_use]
pub fn test_server_config() -> ServerConfig {
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

/// Build complete server resources around an in-memory database
///
/// # Errors
///
/// Returns an error if the database or resource graph fails to initialize.
pub async fn test_resources() -> AppResult<Arc<ServerResources>> {
    let config = Arc::new(test_server_config());
    let database = Database::new("sqlite::memory:").await?;
    let auth_manager = AuthManager::new(&[42u8; 64], config.auth.jwt_expiry_hours);

    Ok(Arc::new(ServerResources::new(
        database,
        auth_manager,
        config,
    )?))
}
