// ABOUTME: Application constants organized by domain
// ABOUTME: Environment variable accessors, default limits, and timeout configuration
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Constants Module
//!
//! Application constants grouped by domain. Environment accessors live in
//! [`env_config`], numeric defaults in [`limits`], and network timeouts in
//! [`timeouts`].

use std::env;

/// Environment-based configuration
pub mod env_config {
    use super::env;

    /// Get HTTP server port from environment or default
    #[must_use]
    pub fn http_port() -> u16 {
        env::var("HTTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8081)
    }

    /// Get database URL from environment or default
    #[must_use]
    pub fn database_url() -> String {
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./data/savora.db".to_owned())
    }

    /// Get log level from environment or default
    #[must_use]
    pub fn log_level() -> String {
        env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned())
    }

    /// Get deployment environment from environment or default
    #[must_use]
    pub fn environment() -> String {
        env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_owned())
    }

    /// Get JWT expiry in hours from environment or default
    #[must_use]
    pub fn jwt_expiry_hours() -> i64 {
        env::var("JWT_EXPIRY_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(super::limits::JWT_EXPIRY_HOURS)
    }

    /// Get allowed CORS origins from environment or default (any origin)
    #[must_use]
    pub fn cors_allowed_origins() -> String {
        env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_owned())
    }
}

/// Default limits
pub mod limits {
    /// JWT token expiry in hours
    pub const JWT_EXPIRY_HOURS: i64 = 24;

    /// Grace period for refreshing an expired token, in hours
    pub const JWT_REFRESH_GRACE_HOURS: i64 = 24;

    /// Attempts allowed per rate limit window
    pub const DEFAULT_RATE_LIMIT_ATTEMPTS: u32 = 5;

    /// Rate limit window length in seconds
    pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

    /// Maximum length of free-form text input after sanitization
    pub const MAX_INPUT_LENGTH: usize = 500;

    /// Maximum length of a person or field name
    pub const MAX_NAME_LENGTH: usize = 100;

    /// Maximum length of an email address (RFC 5321 octet limit)
    pub const MAX_EMAIL_LENGTH: usize = 254;

    /// Minimum password length
    pub const MIN_PASSWORD_LENGTH: usize = 8;

    /// Minimum accepted age in years
    pub const MIN_AGE: u32 = 1;

    /// Maximum accepted age in years
    pub const MAX_AGE: u32 = 120;

    /// Default completion token budget for recipe generation
    pub const DEFAULT_LLM_MAX_TOKENS: u32 = 2000;

    /// Default sampling temperature for recipe generation
    pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.7;

    /// Default page size for list endpoints
    pub const DEFAULT_PAGE_SIZE: u32 = 20;

    /// Maximum page size for list endpoints
    pub const MAX_PAGE_SIZE: u32 = 100;
}

/// Timeout configurations
pub mod timeouts {
    /// Connect timeout for LLM provider requests, in seconds
    pub const LLM_CONNECT_TIMEOUT_SECS: u64 = 30;

    /// Overall request timeout for LLM provider requests, in seconds
    pub const LLM_REQUEST_TIMEOUT_SECS: u64 = 120;

    /// Request timeout applied to all HTTP routes, in seconds
    pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 180;
}

/// System settings keys stored in the database
pub mod system_settings {
    /// Key under which the bootstrap JWT signing secret is persisted
    pub const JWT_SECRET_KEY: &str = "auth_jwt_secret";
}
