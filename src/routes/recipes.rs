// ABOUTME: Recipe generation and library endpoints
// ABOUTME: Drives the LLM generation pipeline and serves the user's stored recipes and favorites
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::constants::limits;
use crate::errors::AppError;
use crate::models::{Favorite, Recipe};
use crate::recipes::{GenerateRecipeRequest, RecipeResponse};
use crate::server::ServerResources;
use crate::validation::validate_text_area;

/// Query parameters for the recipe listing
#[derive(Debug, Deserialize)]
pub struct ListRecipesQuery {
    /// Maximum number of recipes to return
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Number of recipes to skip
    #[serde(default)]
    pub offset: u32,
}

const fn default_limit() -> u32 {
    limits::DEFAULT_PAGE_SIZE
}

/// Payload bookmarking a recipe
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddFavoriteRequest {
    /// Free-text notes on the bookmark
    #[serde(default)]
    pub notes: Option<String>,
}

/// Recipe routes implementation
pub struct RecipeRoutes;

impl RecipeRoutes {
    /// Create all recipe routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/recipes/generate", post(Self::generate))
            .route("/api/recipes", get(Self::list))
            .route("/api/recipes/favorites", get(Self::list_favorites))
            .route("/api/recipes/:recipe_id", get(Self::get))
            .route("/api/recipes/:recipe_id", delete(Self::remove))
            .route("/api/recipes/:recipe_id/favorite", post(Self::add_favorite))
            .route(
                "/api/recipes/:recipe_id/favorite",
                delete(Self::remove_favorite),
            )
            .with_state(resources)
    }

    /// Generate a recipe from the user's preferences and persist it
    async fn generate(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<GenerateRecipeRequest>,
    ) -> Result<impl IntoResponse, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        Self::check_generation_limit(&resources, auth.user.id)?;

        let recipe = resources
            .recipe_generator
            .generate(auth.user.id, &request)
            .await?;
        Ok((StatusCode::CREATED, Json(RecipeResponse::from(recipe))))
    }

    /// List the authenticated user's recipes, newest first
    async fn list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListRecipesQuery>,
    ) -> Result<Json<Vec<Recipe>>, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let limit = query.limit.min(limits::MAX_PAGE_SIZE);
        let recipes = resources
            .database
            .list_recipes_for_user(auth.user.id, limit, query.offset)
            .await?;
        Ok(Json(recipes))
    }

    /// Get one of the authenticated user's recipes
    async fn get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(recipe_id): Path<Uuid>,
    ) -> Result<Json<Recipe>, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let recipe = resources
            .database
            .get_recipe(recipe_id, auth.user.id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe"))?;
        Ok(Json(recipe))
    }

    /// Delete one of the authenticated user's recipes
    async fn remove(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(recipe_id): Path<Uuid>,
    ) -> Result<StatusCode, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        resources
            .database
            .delete_recipe(recipe_id, auth.user.id)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// List the authenticated user's favorite recipes
    async fn list_favorites(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<Recipe>>, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let recipes = resources.database.list_favorites(auth.user.id).await?;
        Ok(Json(recipes))
    }

    /// Bookmark one of the authenticated user's recipes
    async fn add_favorite(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(recipe_id): Path<Uuid>,
        Json(request): Json<AddFavoriteRequest>,
    ) -> Result<impl IntoResponse, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let notes = match request.notes.as_deref() {
            None => None,
            Some(notes) if notes.trim().is_empty() => None,
            Some(notes) => Some(validate_text_area(
                notes,
                limits::MAX_INPUT_LENGTH,
                "Notes",
            )?),
        };

        let favorite: Favorite = resources
            .database
            .add_favorite(auth.user.id, recipe_id, notes)
            .await?;
        Ok((StatusCode::CREATED, Json(favorite)))
    }

    /// Remove a bookmark
    async fn remove_favorite(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(recipe_id): Path<Uuid>,
    ) -> Result<StatusCode, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        resources
            .database
            .remove_favorite(auth.user.id, recipe_id)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// Enforce the per-user generation budget
    fn check_generation_limit(
        resources: &ServerResources,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        if !resources.config.rate_limits.enabled {
            return Ok(());
        }

        let key = format!("generate:{user_id}");
        if resources.generation_limiter.check(&key) {
            return Ok(());
        }

        let limiter = &resources.generation_limiter;
        let reset_at =
            Utc::now() + Duration::from_std(limiter.remaining_time(&key)).unwrap_or_default();
        warn!("Recipe generation rate limit hit for user {user_id}");
        Err(AppError::rate_limit_exceeded(
            limiter.max_attempts(),
            reset_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults_are_applied() {
        let query: ListRecipesQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, limits::DEFAULT_PAGE_SIZE);
        assert_eq!(query.offset, 0);
    }
}
