// ABOUTME: Configuration management module for centralized server settings and parameters
// ABOUTME: Handles environment configs, provider selection, and runtime options
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health
//! Configuration module for the Savora server
//!
//! This module provides centralized configuration management:
//!
//! - **Types**: Log levels, deployment environments, and LLM provider selection
//! - **Environment**: Server configuration loaded from environment variables

/// Environment and server configuration
pub mod environment;
/// Core configuration types shared across modules
pub mod types;

// Re-export main configuration types
pub use environment::{
    AuthConfig, CorsConfig, DatabaseConfig, DatabaseUrl, LlmConfig, RateLimitConfig,
    RateLimitsConfig, ServerConfig,
};
pub use types::{Environment, LlmProviderType, LogLevel};
