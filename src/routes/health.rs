// ABOUTME: Health check route handlers for service monitoring and status endpoints
// ABOUTME: Provides liveness and database readiness endpoints for monitoring infrastructure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

//! Health check routes for service monitoring
//!
//! `/health` reports process liveness; `/ready` additionally pings the
//! database so load balancers only route traffic once storage is up.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use crate::errors::{AppError, ErrorCode};
use crate::server::ServerResources;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::health))
            .route("/ready", get(Self::ready))
            .with_state(resources)
    }

    async fn health() -> Json<Value> {
        Json(json!({
            "status": "healthy",
            "service": "savora-server",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339(),
        }))
    }

    async fn ready(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Json<Value>, AppError> {
        resources.database.ping().await.map_err(|e| {
            AppError::new(ErrorCode::ResourceUnavailable, "Database is not reachable")
                .with_details(json!({"reason": e.message}))
        })?;

        Ok(Json(json!({
            "status": "ready",
            "timestamp": Utc::now().to_rfc3339(),
        })))
    }
}
