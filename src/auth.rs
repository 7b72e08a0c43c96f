// ABOUTME: JWT-based authentication and session management for API access
// ABOUTME: Handles token generation, validation, refresh, and password hashing
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Savora Health

//! # Authentication
//!
//! JWT-based authentication for user sessions. Tokens are HS256-signed with a
//! server-wide secret, carry the user id and email as claims, and expire after
//! a configurable number of hours. Expired tokens remain refreshable for a
//! bounded grace window so active clients can rotate sessions without forcing
//! a new login.

use std::sync::atomic::{AtomicU64, Ordering};

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::constants::limits::JWT_REFRESH_GRACE_HOURS;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::User;

/// Format a duration in human-readable terms for error messages
fn humanize_duration(duration: Duration) -> String {
    let total_secs = duration.num_seconds();
    let hours = duration.num_hours();
    let minutes = duration.num_minutes();

    if hours > 0 {
        format!("{hours} hours")
    } else if minutes > 0 {
        format!("{minutes} minutes")
    } else {
        format!("{total_secs} seconds")
    }
}

/// Detailed JWT validation error types for better error handling
#[derive(Debug, Clone)]
pub enum JwtValidationError {
    /// Token has expired and needs refresh
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
        /// Current time when validation was attempted
        current_time: DateTime<Utc>,
    },
    /// Token signature is invalid or corrupted
    TokenInvalid {
        /// Reason the token failed validation
        reason: String,
    },
    /// Token format is malformed
    TokenMalformed {
        /// Details about the malformation
        details: String,
    },
}

impl std::fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenExpired {
                expired_at,
                current_time,
            } => {
                let elapsed = *current_time - *expired_at;
                let ago = if elapsed.num_minutes() < 60 {
                    format!("{} minutes", elapsed.num_minutes())
                } else if elapsed.num_hours() < 24 {
                    format!("{} hours", elapsed.num_hours())
                } else {
                    format!("{} days", elapsed.num_days())
                };
                write!(
                    f,
                    "JWT token expired {ago} ago at {}",
                    expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                )
            }
            Self::TokenInvalid { reason } => write!(f, "JWT token invalid: {reason}"),
            Self::TokenMalformed { details } => write!(f, "JWT token malformed: {details}"),
        }
    }
}

impl std::error::Error for JwtValidationError {}

impl From<JwtValidationError> for AppError {
    fn from(error: JwtValidationError) -> Self {
        match &error {
            JwtValidationError::TokenExpired { expired_at, .. } => {
                Self::new(ErrorCode::AuthExpired, error.to_string())
                    .with_details(json!({ "expired_at": expired_at.to_rfc3339() }))
            }
            JwtValidationError::TokenInvalid { .. } => Self::auth_invalid(error.to_string()),
            JwtValidationError::TokenMalformed { .. } => Self::auth_malformed(error.to_string()),
        }
    }
}

/// Claims embedded in every session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (UUID as string)
    pub sub: String,
    /// User email address
    pub email: String,
    /// Issued at (milliseconds, made unique per token)
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,
}

/// Issues and validates the JWTs that authenticate API requests
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_hours: i64,
    token_counter: AtomicU64,
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("token_expiry_hours", &self.token_expiry_hours)
            .finish_non_exhaustive()
    }
}

impl Clone for AuthManager {
    fn clone(&self) -> Self {
        Self {
            encoding_key: self.encoding_key.clone(),
            decoding_key: self.decoding_key.clone(),
            token_expiry_hours: self.token_expiry_hours,
            // Start fresh counter for cloned instance - this is acceptable since
            // each instance will maintain uniqueness independently
            token_counter: AtomicU64::new(0),
        }
    }
}

impl AuthManager {
    /// Create a new manager signing with the given secret bytes
    #[must_use]
    pub fn new(secret: &[u8], token_expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_expiry_hours,
            token_counter: AtomicU64::new(0),
        }
    }

    /// Build a manager from a base64-encoded secret as stored in system settings
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the secret is not valid base64.
    pub fn from_base64_secret(secret: &str, token_expiry_hours: i64) -> AppResult<Self> {
        let bytes = general_purpose::STANDARD
            .decode(secret)
            .map_err(|e| AppError::config(format!("JWT secret is not valid base64: {e}")))?;
        Ok(Self::new(&bytes, token_expiry_hours))
    }

    /// Configured lifetime of newly issued tokens, in hours
    #[must_use]
    pub const fn token_expiry_hours(&self) -> i64 {
        self.token_expiry_hours
    }

    /// Generate a session token for the given user
    ///
    /// # Errors
    ///
    /// Returns an error when JWT encoding fails.
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let expiry = now + Duration::hours(self.token_expiry_hours);

        // Millisecond-scale iat plus a counter so rapid successive calls never
        // produce identical tokens for the same user
        let counter = self.token_counter.fetch_add(1, Ordering::Relaxed);
        let unique_iat =
            now.timestamp() * 1000 + i64::from(u32::try_from(counter % 1000).unwrap_or(0));

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: unique_iat,
            exp: expiry.timestamp(),
        };
        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode JWT: {e}")))
    }

    /// Validate a token and return its claims
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the token is expired, has an
    /// invalid signature, or is structurally malformed.
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        self.validate_token_detailed(token).map_err(AppError::from)
    }

    /// Validate a token with detailed error information
    ///
    /// # Errors
    ///
    /// Returns the specific [`JwtValidationError`] describing what failed.
    pub fn validate_token_detailed(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let claims = self.decode_token_claims(token)?;
        Self::validate_claims_expiry(&claims)?;
        debug!("JWT validated for user {}", claims.sub);
        Ok(claims)
    }

    /// Decode and signature-check a token without enforcing expiry
    fn decode_token_claims(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked separately so expired tokens can produce a
        // detailed error instead of a generic rejection
        validation.validate_exp = false;
        // Session tokens carry no audience claim
        validation.validate_aud = false;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Self::convert_jwt_error(&e))
    }

    fn validate_claims_expiry(claims: &Claims) -> Result<(), JwtValidationError> {
        let current_time = Utc::now();
        let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);

        if current_time.timestamp() >= claims.exp {
            return Err(Self::check_token_expiry(claims, current_time, expired_at));
        }
        Ok(())
    }

    fn check_token_expiry(
        claims: &Claims,
        current_time: DateTime<Utc>,
        expired_at: DateTime<Utc>,
    ) -> JwtValidationError {
        warn!(
            "JWT expired for user {}: expired at {expired_at}, current time {current_time}",
            claims.sub
        );
        JwtValidationError::TokenExpired {
            expired_at,
            current_time,
        }
    }

    /// Convert `jsonwebtoken` errors into detailed validation errors
    fn convert_jwt_error(error: &jsonwebtoken::errors::Error) -> JwtValidationError {
        use jsonwebtoken::errors::ErrorKind;

        match error.kind() {
            ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
                reason: "Token signature verification failed".into(),
            },
            ErrorKind::InvalidToken => JwtValidationError::TokenMalformed {
                details: "Token format is invalid".into(),
            },
            ErrorKind::Base64(e) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid base64: {e}"),
            },
            ErrorKind::Json(e) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid JSON: {e}"),
            },
            ErrorKind::Utf8(e) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid UTF-8: {e}"),
            },
            _ => JwtValidationError::TokenInvalid {
                reason: format!("Token validation failed: {error}"),
            },
        }
    }

    /// Reissue a session token, accepting recently expired tokens
    ///
    /// The old token must have a valid signature and belong to `user`. Tokens
    /// expired longer than the refresh grace window are rejected and the
    /// client has to log in again.
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the old token fails signature
    /// checks, belongs to a different user, or is past the grace window.
    pub fn refresh_token(&self, token: &str, user: &User) -> AppResult<String> {
        let claims = self.decode_token_claims(token).map_err(AppError::from)?;

        if claims.sub != user.id.to_string() {
            return Err(AppError::auth_invalid("Token does not belong to this user"));
        }

        let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
        let refresh_deadline = expired_at + Duration::hours(JWT_REFRESH_GRACE_HOURS);
        if Utc::now() > refresh_deadline {
            return Err(AppError::new(
                ErrorCode::AuthExpired,
                format!(
                    "Token expired more than {} ago and can no longer be refreshed",
                    humanize_duration(Duration::hours(JWT_REFRESH_GRACE_HOURS))
                ),
            ));
        }

        debug!("Refreshing session token for user {}", user.id);
        self.generate_token(user)
    }

    /// Extract the user id from a token, tolerating expiry
    ///
    /// Signature and structure are still enforced. Used where the caller needs
    /// to know who a token belonged to, such as refresh and audit paths.
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the signature is invalid or the
    /// subject claim is not a UUID.
    pub fn extract_user_id(&self, token: &str) -> AppResult<Uuid> {
        let claims = self.decode_token_claims(token).map_err(AppError::from)?;
        Uuid::parse_str(&claims.sub).map_err(|e| {
            AppError::auth_malformed(format!("Token subject is not a valid user id: {e}"))
        })
    }
}

/// Hash a password with bcrypt at the default cost
///
/// Runs on the blocking thread pool because bcrypt is deliberately slow.
///
/// # Errors
///
/// Returns an internal error when hashing fails or the blocking task panics.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))
}

/// Check a password against a stored bcrypt hash
///
/// # Errors
///
/// Returns an internal error when verification fails or the blocking task
/// panics. A wrong password is `Ok(false)`, not an error.
pub async fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let password = password.to_owned();
    let hash = password_hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Failed to verify password: {e}")))
}

/// Generate a cryptographically secure JWT signing secret, base64-encoded
///
/// # Errors
///
/// Returns an internal error when the system RNG fails.
pub fn generate_jwt_secret() -> AppResult<String> {
    let rng = SystemRandom::new();
    let mut secret = [0u8; 64];
    rng.fill(&mut secret).map_err(|_| {
        error!("CRITICAL: System RNG failure - cannot generate secure JWT secret");
        AppError::internal("System RNG failure - cannot generate secure JWT secret")
    })?;
    Ok(general_purpose::STANDARD.encode(secret))
}
