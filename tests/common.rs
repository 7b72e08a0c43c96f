// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides router construction with a canned LLM, request helpers, and session setup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

//! Shared test utilities for `savora_server`
//!
//! Builds complete server resources around an in-memory database and a
//! canned LLM provider so HTTP tests never leave the process.

use std::sync::{Arc, Once};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use savora_server::auth::AuthManager;
use savora_server::database::Database;
use savora_server::errors::AppError;
use savora_server::llm::{ChatRequest, ChatResponse, LlmCapabilities, LlmProvider};
use savora_server::middleware::AuthMiddleware;
use savora_server::rate_limiting::FixedWindowLimiter;
use savora_server::recipes::RecipeGenerator;
use savora_server::security::SecurityMonitor;
use savora_server::server::{HttpServer, ServerResources};
use savora_server::test_utils::test_server_config;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

/// LLM provider returning a fixed completion, or a fixed failure
pub struct CannedLlm {
    content: Option<String>,
}

impl CannedLlm {
    pub fn completing(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }

    pub const fn failing() -> Self {
        Self { content: None }
    }
}

#[async_trait]
impl LlmProvider for CannedLlm {
    fn name(&self) -> &'static str {
        "canned"
    }

    fn display_name(&self) -> &'static str {
        "Canned"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::text_only()
    }

    fn default_model(&self) -> &str {
        "canned-1"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        match &self.content {
            Some(content) => Ok(ChatResponse {
                content: content.clone(),
                model: "canned-1".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            None => Err(AppError::external_service("canned", "provider down")),
        }
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(self.content.is_some())
    }
}

/// A recipe completion in the exact shape the generation prompt demands
pub fn canned_recipe_json() -> String {
    json!({
        "title": "Iron-Rich Lentil Bowl",
        "description": "A hearty bowl built around lentils and greens",
        "cookTime": "35 minutes",
        "servings": 2,
        "difficulty": "Easy",
        "ingredients": ["1 cup red lentils", "2 cups spinach", "1 onion"],
        "instructions": ["Rinse the lentils", "Simmer until tender", "Fold in the spinach"],
        "nutritionInfo": {
            "calories": 420.0,
            "protein": "24g",
            "carbs": "58g",
            "fat": "9g",
            "fiber": "15g"
        },
        "shoppingList": ["red lentils", "spinach", "onion"],
        "allergenWarnings": [],
        "nutritionalBenefits": ["High in iron", "Good source of fiber"]
    })
    .to_string()
}

/// A valid generation request body in the client's camelCase wire format
pub fn generation_request_body() -> Value {
    json!({
        "foodPreference": "high iron",
        "allergies": [],
        "deficiencies": ["Iron"],
        "age": "29",
        "gender": "female",
        "activityLevel": "moderate",
        "cuisine": "Mediterranean",
        "dietaryRestrictions": ""
    })
}

/// Build full server resources around an in-memory database and the given provider
pub async fn test_resources_with_llm(provider: CannedLlm) -> Arc<ServerResources> {
    init_test_logging();

    let config = Arc::new(test_server_config());
    let database = Arc::new(Database::new("sqlite::memory:").await.unwrap());
    let auth_manager = Arc::new(AuthManager::new(&[11u8; 64], config.auth.jwt_expiry_hours));
    let auth_middleware = Arc::new(AuthMiddleware::new(
        Arc::clone(&auth_manager),
        Arc::clone(&database),
    ));
    let recipe_generator = Arc::new(RecipeGenerator::new(
        Arc::new(provider),
        Arc::clone(&database),
        &config.llm,
    ));
    let security_monitor = Arc::new(SecurityMonitor::new(Arc::clone(&database)));
    let auth_limiter = Arc::new(FixedWindowLimiter::from_config(config.rate_limits.auth));
    let generation_limiter = Arc::new(FixedWindowLimiter::from_config(
        config.rate_limits.generation,
    ));

    Arc::new(ServerResources {
        database,
        auth_manager,
        auth_middleware,
        recipe_generator,
        security_monitor,
        auth_limiter,
        generation_limiter,
        config,
    })
}

/// An app router whose generation endpoint always succeeds
pub async fn test_app() -> (Router, Arc<ServerResources>) {
    let resources = test_resources_with_llm(CannedLlm::completing(canned_recipe_json())).await;
    (HttpServer::new(Arc::clone(&resources)).router(), resources)
}

/// Send a JSON request through the router
pub async fn send_json(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

/// Read a response body as JSON
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register an account and log in, returning the session token
pub async fn register_and_login(app: &Router, email: &str) -> String {
    let response = send_json(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(&json!({
            "email": email,
            "password": "Str0ng!pass",
            "display_name": "Test Cook"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send_json(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(&json!({ "email": email, "password": "Str0ng!pass" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    body["jwt_token"].as_str().unwrap().to_owned()
}
