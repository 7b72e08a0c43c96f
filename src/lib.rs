// ABOUTME: Main library entry point for the Savora nutrition API
// ABOUTME: Exposes auth, persistence, LLM integration, and HTTP routing modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

#![deny(unsafe_code)]

//! # Savora Server
//!
//! A self-hosted backend for personalized, AI-generated recipes. An
//! authenticated user sets up a nutrition profile (allergies,
//! deficiencies), submits food preferences, and receives a generated
//! recipe with ingredients, instructions, nutrition facts, and a shopping
//! list, persisted to SQLite.
//!
//! ## Features
//!
//! - **Email/password auth**: bcrypt hashing and HS256 JWT session tokens
//! - **Nutrition profiles**: allergy and deficiency links over seeded catalogs
//! - **Recipe generation**: prompt assembly, LLM completion, JSON parsing,
//!   allergen guarding, and persistence in one pipeline
//! - **Shopping lists**: catalog-linked and free-text items
//! - **Security events**: client-reported and server-side auth events
//!
//! ## Architecture
//!
//! - **Routes**: axum route groups sharing one [`server::ServerResources`]
//! - **Database**: sqlx/SQLite persistence with idempotent migrations
//! - **LLM**: provider trait with an OpenAI-compatible implementation
//! - **Validation**: sanitization helpers applied to every free-text field
//!
//! ## Example
//!
//! ```rust,no_run
//! use savora_server::config::environment::ServerConfig;
//! use savora_server::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Savora server configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Authentication and session token management
pub mod auth;

/// Configuration management
pub mod config;

/// Application constants and environment accessors
pub mod constants;

/// SQLite persistence layer
pub mod database;

/// Unified error handling with standard error codes and HTTP responses
pub mod errors;

/// LLM provider abstraction and the OpenAI-compatible client
pub mod llm;

/// Structured logging initialization
pub mod logging;

/// HTTP middleware for authentication and CORS
pub mod middleware;

/// Core data models
pub mod models;

/// Fixed-window rate limiting
pub mod rate_limiting;

/// Recipe generation pipeline
pub mod recipes;

/// HTTP route handlers grouped by domain
pub mod routes;

/// Security event taxonomy and monitor
pub mod security;

/// HTTP server wiring and lifecycle
pub mod server;

/// Shared fixtures for unit and integration tests
pub mod test_utils;

/// Input validation and sanitization helpers
pub mod validation;
