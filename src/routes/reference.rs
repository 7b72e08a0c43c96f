// ABOUTME: Read-only endpoints for the seeded reference catalogs
// ABOUTME: Serves the allergy, deficiency, and ingredient lists the profile and form screens consume
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    routing::get,
    Json, Router,
};

use crate::errors::AppError;
use crate::models::{Allergy, Deficiency, Ingredient};
use crate::server::ServerResources;

/// Reference catalog routes implementation
pub struct ReferenceRoutes;

impl ReferenceRoutes {
    /// Create all reference catalog routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/reference/allergies", get(Self::list_allergies))
            .route("/api/reference/deficiencies", get(Self::list_deficiencies))
            .route("/api/reference/ingredients", get(Self::list_ingredients))
            .with_state(resources)
    }

    /// List the allergy catalog
    async fn list_allergies(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<Allergy>>, AppError> {
        resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;
        Ok(Json(resources.database.list_allergies().await?))
    }

    /// List the deficiency catalog
    async fn list_deficiencies(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<Deficiency>>, AppError> {
        resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;
        Ok(Json(resources.database.list_deficiencies().await?))
    }

    /// List the ingredient catalog
    async fn list_ingredients(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<Ingredient>>, AppError> {
        resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;
        Ok(Json(resources.database.list_ingredients().await?))
    }
}
