// ABOUTME: Registration, login, and token refresh endpoints
// ABOUTME: Rate limits credential attempts and records auth outcomes as security events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, AuthManager};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::rate_limiting::FixedWindowLimiter;
use crate::routes::security::{client_ip, user_agent};
use crate::security::SecurityEventType;
use crate::server::ServerResources;
use crate::validation::{validate_email, validate_name, validate_password};

/// Registration request payload
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Email address, unique per account
    pub email: String,
    /// Password meeting the account policy
    pub password: String,
    /// Optional display name
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Registration response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Id of the new account
    pub user_id: String,
    /// Human-readable confirmation
    pub message: String,
}

/// Login request payload
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Public account fields returned with a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    /// Account id
    pub user_id: String,
    /// Account email
    pub email: String,
    /// Display name when set
    pub display_name: Option<String>,
}

/// Session token response for login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    pub jwt_token: String,
    /// Token expiry as an RFC 3339 timestamp
    pub expires_at: String,
    /// The authenticated account
    pub user: UserInfo,
}

/// Token refresh request payload
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenRequest {
    /// The current, possibly recently expired, session token
    pub token: String,
}

/// Credential handling behind the auth routes
///
/// Owns the database and token manager so the handlers stay thin and the
/// same logic is reachable from tests without HTTP plumbing.
pub struct AuthService {
    database: Arc<Database>,
    auth_manager: Arc<AuthManager>,
}

impl AuthService {
    /// Create an auth service over the shared database and token manager
    #[must_use]
    pub const fn new(database: Arc<Database>, auth_manager: Arc<AuthManager>) -> Self {
        Self {
            database,
            auth_manager,
        }
    }

    /// Register a new account
    ///
    /// # Errors
    ///
    /// Returns validation errors for a bad email, weak password, or invalid
    /// display name, and `ResourceAlreadyExists` when the email is taken.
    pub async fn register(&self, request: &RegisterRequest) -> AppResult<RegisterResponse> {
        info!("User registration attempt for email: {}", request.email);

        validate_email(&request.email)?;
        validate_password(&request.password)?;
        let display_name = match request.display_name.as_deref() {
            None => None,
            Some(name) if name.trim().is_empty() => None,
            Some(name) => Some(validate_name(name, "Display name")?),
        };

        if self
            .database
            .get_user_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(AppError::already_exists(
                "A user with this email already exists",
            ));
        }

        let password_hash = hash_password(&request.password).await?;
        let user = User::new(request.email.clone(), password_hash, display_name);
        let user_id = self.database.create_user(&user).await?;

        info!("User registered successfully: {} ({user_id})", request.email);
        Ok(RegisterResponse {
            user_id: user_id.to_string(),
            message: "User registered successfully".to_owned(),
        })
    }

    /// Authenticate an account and issue a session token
    ///
    /// Unknown emails and wrong passwords produce the same error so the
    /// endpoint cannot be used to probe for registered addresses.
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` for bad credentials and `PermissionDenied`
    /// when the account may not log in.
    pub async fn login(&self, request: &LoginRequest) -> AppResult<LoginResponse> {
        info!("User login attempt for email: {}", request.email);

        let user = self
            .database
            .get_user_by_email_required(&request.email)
            .await
            .map_err(|_| AppError::auth_invalid("Invalid email or password"))?;

        let password_ok = verify_password(&request.password, &user.password_hash).await?;
        if !password_ok {
            warn!("Invalid password for user: {}", request.email);
            return Err(AppError::auth_invalid("Invalid email or password"));
        }

        if !user.can_login() {
            warn!(
                "Login blocked for user: {} - status: {}",
                request.email, user.user_status
            );
            return Err(AppError::permission_denied(user.user_status.to_message()));
        }

        self.database.update_last_active(user.id).await?;
        let response = self.session_response(&user)?;

        info!("User logged in successfully: {} ({})", user.email, user.id);
        Ok(response)
    }

    /// Reissue a session token from a current or recently expired one
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the old token fails signature
    /// checks, is past the refresh grace window, or its user is gone or
    /// blocked from logging in.
    pub async fn refresh(&self, request: &RefreshTokenRequest) -> AppResult<LoginResponse> {
        let user_id = self.auth_manager.extract_user_id(&request.token)?;
        let user = self
            .database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Token user no longer exists"))?;

        if !user.can_login() {
            return Err(AppError::permission_denied(user.user_status.to_message()));
        }

        let jwt_token = self.auth_manager.refresh_token(&request.token, &user)?;
        self.database.update_last_active(user.id).await?;

        info!("Token refreshed successfully for user: {}", user.id);
        Ok(Self::token_response(&self.auth_manager, jwt_token, &user))
    }

    fn session_response(&self, user: &User) -> AppResult<LoginResponse> {
        let jwt_token = self.auth_manager.generate_token(user)?;
        Ok(Self::token_response(&self.auth_manager, jwt_token, user))
    }

    fn token_response(auth_manager: &AuthManager, jwt_token: String, user: &User) -> LoginResponse {
        let expires_at = Utc::now() + Duration::hours(auth_manager.token_expiry_hours());
        LoginResponse {
            jwt_token,
            expires_at: expires_at.to_rfc3339(),
            user: UserInfo {
                user_id: user.id.to_string(),
                email: user.email.clone(),
                display_name: user.display_name.clone(),
            },
        }
    }
}

/// Authentication routes implementation
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::register))
            .route("/api/auth/login", post(Self::login))
            .route("/api/auth/refresh", post(Self::refresh))
            .with_state(resources)
    }

    /// Handle user registration
    async fn register(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        peer: Option<ConnectInfo<SocketAddr>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<impl IntoResponse, AppError> {
        check_limiter(&resources, &resources.auth_limiter, &attempt_key("register", &request.email))?;

        let service = AuthService::new(
            Arc::clone(&resources.database),
            Arc::clone(&resources.auth_manager),
        );
        let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
        let agent = user_agent(&headers);

        match service.register(&request).await {
            Ok(response) => {
                let user_id = response.user_id.parse().ok();
                resources
                    .security_monitor
                    .log_auth_event(
                        SecurityEventType::SignupSuccess,
                        user_id,
                        &request.email,
                        ip,
                        agent,
                    )
                    .await;
                Ok((StatusCode::CREATED, Json(response)))
            }
            Err(e) => {
                resources
                    .security_monitor
                    .log_auth_event(SecurityEventType::SignupFailed, None, &request.email, ip, agent)
                    .await;
                Err(e)
            }
        }
    }

    /// Handle user login
    async fn login(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        peer: Option<ConnectInfo<SocketAddr>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Json<LoginResponse>, AppError> {
        let key = attempt_key("login", &request.email);
        check_limiter(&resources, &resources.auth_limiter, &key)?;

        let service = AuthService::new(
            Arc::clone(&resources.database),
            Arc::clone(&resources.auth_manager),
        );
        let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
        let agent = user_agent(&headers);

        match service.login(&request).await {
            Ok(response) => {
                // A successful login clears the failed-attempt budget
                resources.auth_limiter.reset(&key);
                let user_id = response.user.user_id.parse().ok();
                resources
                    .security_monitor
                    .log_auth_event(
                        SecurityEventType::LoginSuccess,
                        user_id,
                        &request.email,
                        ip,
                        agent,
                    )
                    .await;
                Ok(Json(response))
            }
            Err(e) => {
                resources
                    .security_monitor
                    .log_auth_event(SecurityEventType::LoginFailed, None, &request.email, ip, agent)
                    .await;
                Err(e)
            }
        }
    }

    /// Handle token refresh
    async fn refresh(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RefreshTokenRequest>,
    ) -> Result<Json<LoginResponse>, AppError> {
        let service = AuthService::new(
            Arc::clone(&resources.database),
            Arc::clone(&resources.auth_manager),
        );
        Ok(Json(service.refresh(&request).await?))
    }
}

fn attempt_key(operation: &str, email: &str) -> String {
    format!("{operation}:{}", email.trim().to_lowercase())
}

fn check_limiter(
    resources: &ServerResources,
    limiter: &FixedWindowLimiter,
    key: &str,
) -> AppResult<()> {
    if !resources.config.rate_limits.enabled {
        return Ok(());
    }
    if limiter.check(key) {
        return Ok(());
    }

    let reset_at =
        Utc::now() + Duration::from_std(limiter.remaining_time(key)).unwrap_or_default();
    warn!("Rate limit hit for {key}");
    Err(AppError::rate_limit_exceeded(
        limiter.max_attempts(),
        reset_at,
    ))
}
