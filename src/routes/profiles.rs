// ABOUTME: Profile endpoints plus the user's allergy and deficiency links
// ABOUTME: Backs the nutrition profile setup flow with upsert and link management
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::constants::limits;
use crate::database::ProfileUpdate;
use crate::errors::AppError;
use crate::models::{Profile, Severity, UserAllergy, UserDeficiency};
use crate::server::ServerResources;
use crate::validation::{validate_name, validate_text_area};

/// Partial profile update payload; omitted fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    /// Unique handle
    #[serde(default)]
    pub username: Option<String>,
    /// Full name
    #[serde(default)]
    pub full_name: Option<String>,
    /// Avatar image URL
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Short biography
    #[serde(default)]
    pub bio: Option<String>,
}

/// Payload linking an allergy catalog entry to the user
#[derive(Debug, Clone, Deserialize)]
pub struct AddAllergyRequest {
    /// Catalog entry to link
    pub allergy_id: Uuid,
    /// Severity of this user's reaction
    #[serde(default)]
    pub severity: Severity,
    /// Free-text notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Payload linking a deficiency catalog entry to the user
#[derive(Debug, Clone, Deserialize)]
pub struct AddDeficiencyRequest {
    /// Catalog entry to link
    pub deficiency_id: Uuid,
    /// Severity of this user's deficiency
    #[serde(default)]
    pub severity: Severity,
    /// Free-text notes
    #[serde(default)]
    pub notes: Option<String>,
    /// When the deficiency was diagnosed
    #[serde(default)]
    pub diagnosed_date: Option<NaiveDate>,
}

/// Profile routes implementation
pub struct ProfileRoutes;

impl ProfileRoutes {
    /// Create all profile and dietary-link routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/profile", get(Self::get_profile))
            .route("/api/profile", put(Self::update_profile))
            .route("/api/profile/allergies", get(Self::list_allergies))
            .route("/api/profile/allergies", post(Self::add_allergy))
            .route(
                "/api/profile/allergies/:link_id",
                delete(Self::remove_allergy),
            )
            .route("/api/profile/deficiencies", get(Self::list_deficiencies))
            .route("/api/profile/deficiencies", post(Self::add_deficiency))
            .route(
                "/api/profile/deficiencies/:link_id",
                delete(Self::remove_deficiency),
            )
            .with_state(resources)
    }

    /// Get the authenticated user's profile
    async fn get_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Profile>, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let profile = resources
            .database
            .get_profile(auth.user.id)
            .await?
            .ok_or_else(|| AppError::not_found("Profile"))?;
        Ok(Json(profile))
    }

    /// Create or partially update the authenticated user's profile
    async fn update_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<UpdateProfileRequest>,
    ) -> Result<Json<Profile>, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let update = sanitize_profile_update(&request)?;
        let profile = resources
            .database
            .upsert_profile(auth.user.id, &update)
            .await?;
        Ok(Json(profile))
    }

    /// List the authenticated user's allergy links
    async fn list_allergies(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<UserAllergy>>, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let links = resources.database.list_user_allergies(auth.user.id).await?;
        Ok(Json(links))
    }

    /// Link an allergy catalog entry to the authenticated user
    async fn add_allergy(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<AddAllergyRequest>,
    ) -> Result<impl IntoResponse, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let notes = sanitize_notes(request.notes.as_deref())?;
        let link = resources
            .database
            .add_user_allergy(auth.user.id, request.allergy_id, request.severity, notes)
            .await?;
        Ok((StatusCode::CREATED, Json(link)))
    }

    /// Remove one of the authenticated user's allergy links
    async fn remove_allergy(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(link_id): Path<Uuid>,
    ) -> Result<StatusCode, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        resources
            .database
            .remove_user_allergy(auth.user.id, link_id)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// List the authenticated user's deficiency links
    async fn list_deficiencies(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<UserDeficiency>>, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let links = resources
            .database
            .list_user_deficiencies(auth.user.id)
            .await?;
        Ok(Json(links))
    }

    /// Link a deficiency catalog entry to the authenticated user
    async fn add_deficiency(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<AddDeficiencyRequest>,
    ) -> Result<impl IntoResponse, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let notes = sanitize_notes(request.notes.as_deref())?;
        let link = resources
            .database
            .add_user_deficiency(
                auth.user.id,
                request.deficiency_id,
                request.severity,
                notes,
                request.diagnosed_date,
            )
            .await?;
        Ok((StatusCode::CREATED, Json(link)))
    }

    /// Remove one of the authenticated user's deficiency links
    async fn remove_deficiency(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(link_id): Path<Uuid>,
    ) -> Result<StatusCode, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        resources
            .database
            .remove_user_deficiency(auth.user.id, link_id)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }
}

/// Sanitize each provided profile field, dropping fields that blank out
fn sanitize_profile_update(request: &UpdateProfileRequest) -> Result<ProfileUpdate, AppError> {
    let mut update = ProfileUpdate::default();

    if let Some(username) = non_empty(request.username.as_deref()) {
        update.username = Some(validate_name(username, "Username")?);
    }
    if let Some(full_name) = non_empty(request.full_name.as_deref()) {
        update.full_name = Some(validate_name(full_name, "Full name")?);
    }
    if let Some(avatar_url) = non_empty(request.avatar_url.as_deref()) {
        update.avatar_url = Some(validate_text_area(
            avatar_url,
            limits::MAX_INPUT_LENGTH,
            "Avatar URL",
        )?);
    }
    if let Some(bio) = non_empty(request.bio.as_deref()) {
        update.bio = Some(validate_text_area(bio, limits::MAX_INPUT_LENGTH, "Bio")?);
    }

    Ok(update)
}

fn sanitize_notes(notes: Option<&str>) -> Result<Option<String>, AppError> {
    match non_empty(notes) {
        None => Ok(None),
        Some(notes) => Ok(Some(validate_text_area(
            notes,
            limits::MAX_INPUT_LENGTH,
            "Notes",
        )?)),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
