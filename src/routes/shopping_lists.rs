// ABOUTME: Shopping list CRUD endpoints
// ABOUTME: Manages lists and their catalog-linked or free-text items for the authenticated user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::constants::limits;
use crate::database::{NewShoppingListItem, ShoppingListItemUpdate};
use crate::errors::AppError;
use crate::models::{ShoppingList, ShoppingListWithItems};
use crate::server::ServerResources;
use crate::validation::{validate_name, validate_text_area};

/// Payload creating a shopping list
#[derive(Debug, Clone, Deserialize)]
pub struct CreateListRequest {
    /// List name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Payload adding an item to a list
///
/// Exactly one of `ingredient_id` and `custom_item_name` must be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddItemRequest {
    /// Catalog ingredient reference
    #[serde(default)]
    pub ingredient_id: Option<Uuid>,
    /// Free-text item name for off-catalog items
    #[serde(default)]
    pub custom_item_name: Option<String>,
    /// Amount to buy
    #[serde(default)]
    pub quantity: Option<f64>,
    /// Unit for the quantity
    #[serde(default)]
    pub unit: Option<String>,
    /// Free-text notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial item update payload; omitted fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItemRequest {
    /// Whether the item has been purchased
    #[serde(default)]
    pub is_purchased: Option<bool>,
    /// Amount to buy
    #[serde(default)]
    pub quantity: Option<f64>,
    /// Unit for the quantity
    #[serde(default)]
    pub unit: Option<String>,
    /// Free-text notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Shopping list routes implementation
pub struct ShoppingListRoutes;

impl ShoppingListRoutes {
    /// Create all shopping list routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/shopping-lists", get(Self::list))
            .route("/api/shopping-lists", post(Self::create))
            .route("/api/shopping-lists/:list_id", get(Self::get))
            .route("/api/shopping-lists/:list_id", delete(Self::remove))
            .route("/api/shopping-lists/:list_id/items", post(Self::add_item))
            .route(
                "/api/shopping-lists/:list_id/items/:item_id",
                patch(Self::update_item),
            )
            .route(
                "/api/shopping-lists/:list_id/items/:item_id",
                delete(Self::remove_item),
            )
            .with_state(resources)
    }

    /// List the authenticated user's shopping lists
    async fn list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<ShoppingList>>, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let lists = resources.database.list_shopping_lists(auth.user.id).await?;
        Ok(Json(lists))
    }

    /// Create a shopping list
    async fn create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateListRequest>,
    ) -> Result<impl IntoResponse, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let name = validate_name(&request.name, "List name")?;
        let description = sanitize_optional(request.description.as_deref(), "Description")?;
        let list = resources
            .database
            .create_shopping_list(auth.user.id, name, description)
            .await?;
        Ok((StatusCode::CREATED, Json(list)))
    }

    /// Get a shopping list with its items
    async fn get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(list_id): Path<Uuid>,
    ) -> Result<Json<ShoppingListWithItems>, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let list = resources
            .database
            .get_shopping_list(list_id, auth.user.id)
            .await?
            .ok_or_else(|| AppError::not_found("Shopping list"))?;
        Ok(Json(list))
    }

    /// Delete a shopping list and its items
    async fn remove(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(list_id): Path<Uuid>,
    ) -> Result<StatusCode, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        resources
            .database
            .delete_shopping_list(list_id, auth.user.id)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// Add an item to a shopping list
    async fn add_item(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(list_id): Path<Uuid>,
        Json(request): Json<AddItemRequest>,
    ) -> Result<impl IntoResponse, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let item = NewShoppingListItem {
            ingredient_id: request.ingredient_id,
            custom_item_name: sanitize_optional(request.custom_item_name.as_deref(), "Item name")?,
            quantity: request.quantity,
            unit: sanitize_optional(request.unit.as_deref(), "Unit")?,
            notes: sanitize_optional(request.notes.as_deref(), "Notes")?,
        };

        let created = resources
            .database
            .add_shopping_list_item(list_id, auth.user.id, &item)
            .await?;
        Ok((StatusCode::CREATED, Json(created)))
    }

    /// Partially update an item on a shopping list
    async fn update_item(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((list_id, item_id)): Path<(Uuid, Uuid)>,
        Json(request): Json<UpdateItemRequest>,
    ) -> Result<Json<crate::models::ShoppingListItem>, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let update = ShoppingListItemUpdate {
            is_purchased: request.is_purchased,
            quantity: request.quantity,
            unit: sanitize_optional(request.unit.as_deref(), "Unit")?,
            notes: sanitize_optional(request.notes.as_deref(), "Notes")?,
        };

        let item = resources
            .database
            .update_shopping_list_item(list_id, auth.user.id, item_id, &update)
            .await?;
        Ok(Json(item))
    }

    /// Remove an item from a shopping list
    async fn remove_item(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((list_id, item_id)): Path<(Uuid, Uuid)>,
    ) -> Result<StatusCode, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        resources
            .database
            .remove_shopping_list_item(list_id, auth.user.id, item_id)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }
}

fn sanitize_optional(value: Option<&str>, field: &str) -> Result<Option<String>, AppError> {
    match value {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => Ok(Some(validate_text_area(
            value,
            limits::MAX_INPUT_LENGTH,
            field,
        )?)),
    }
}
