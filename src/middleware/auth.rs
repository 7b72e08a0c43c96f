// ABOUTME: JWT authentication middleware for API requests
// ABOUTME: Validates bearer tokens and resolves the active user behind each request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::{debug, instrument, warn, Span};

use crate::auth::AuthManager;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::User;

/// A successfully authenticated request principal
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The user behind the request
    pub user: User,
}

/// Middleware for bearer token authentication
#[derive(Clone)]
pub struct AuthMiddleware {
    auth_manager: Arc<AuthManager>,
    database: Arc<Database>,
}

impl AuthMiddleware {
    /// Create new auth middleware
    #[must_use]
    pub const fn new(auth_manager: Arc<AuthManager>, database: Arc<Database>) -> Self {
        Self {
            auth_manager,
            database,
        }
    }

    /// Authenticate a request from its headers
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The Authorization header is missing
    /// - The header is not a bearer token
    /// - Token validation fails or the token has expired
    /// - The token's user no longer exists
    /// - The account is not allowed to log in
    #[instrument(
        skip(self, headers),
        fields(user_id = tracing::field::Empty, success = tracing::field::Empty)
    )]
    pub async fn authenticate_request(&self, headers: &HeaderMap) -> AppResult<AuthenticatedUser> {
        let Some(auth_header) = headers.get("authorization").and_then(|h| h.to_str().ok()) else {
            warn!("Authentication failed: missing authorization header");
            return Err(AppError::auth_required());
        };

        // Header content stays out of the logs to prevent token leakage
        let Some(token) = auth_header.strip_prefix("Bearer ") else {
            Span::current().record("success", false);
            warn!("Authentication failed: authorization header is not a bearer token");
            return Err(AppError::auth_malformed(
                "Authorization header must be 'Bearer <token>'",
            ));
        };

        let claims = match self.auth_manager.validate_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                Span::current().record("success", false);
                warn!("Token validation failed: {e}");
                return Err(e);
            }
        };

        let user_id = claims
            .sub
            .parse()
            .map_err(|_| AppError::auth_invalid("Invalid user ID in token"))?;

        let user = self
            .database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Token user no longer exists"))?;

        if !user.can_login() {
            Span::current().record("success", false);
            warn!("Blocked request from non-active account {user_id}");
            return Err(AppError::permission_denied(user.user_status.to_message()));
        }

        Span::current()
            .record("user_id", user_id.to_string())
            .record("success", true);
        debug!("Authenticated request for user {user_id}");

        Ok(AuthenticatedUser { user })
    }
}
