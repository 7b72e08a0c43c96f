// ABOUTME: Security event monitoring for authentication and session activity
// ABOUTME: Mirrors events to the structured log and the security_events table

//! # Security Monitoring Module
//!
//! Captures the security-relevant moments of the application lifecycle:
//! - Login, logout, and signup outcomes
//! - Session starts, ends, and activity transitions
//! - Suspicious input and API abuse reports from clients

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::Database;
use crate::errors::AppError;

/// Types of security events tracked by the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityEventType {
    // Authentication events
    LoginSuccess,
    LoginFailed,
    Logout,
    SignupSuccess,
    SignupFailed,

    // Access events
    SuspiciousActivity,
    AccessGranted,
    AccessDenied,

    // Session events
    SessionStart,
    SessionEnd,
    SessionActive,
    SessionInactive,

    // Client-reported abuse signals
    PotentialXssAttempt,
    PotentialApiAbuse,
}

impl SecurityEventType {
    /// Wire name of the event type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoginSuccess => "LOGIN_SUCCESS",
            Self::LoginFailed => "LOGIN_FAILED",
            Self::Logout => "LOGOUT",
            Self::SignupSuccess => "SIGNUP_SUCCESS",
            Self::SignupFailed => "SIGNUP_FAILED",
            Self::SuspiciousActivity => "SUSPICIOUS_ACTIVITY",
            Self::AccessGranted => "ACCESS_GRANTED",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::SessionStart => "SESSION_START",
            Self::SessionEnd => "SESSION_END",
            Self::SessionActive => "SESSION_ACTIVE",
            Self::SessionInactive => "SESSION_INACTIVE",
            Self::PotentialXssAttempt => "POTENTIAL_XSS_ATTEMPT",
            Self::PotentialApiAbuse => "POTENTIAL_API_ABUSE",
        }
    }

    /// Whether the event signals a failure or possible abuse
    #[must_use]
    pub const fn is_alert(self) -> bool {
        matches!(
            self,
            Self::LoginFailed
                | Self::SignupFailed
                | Self::SuspiciousActivity
                | Self::AccessDenied
                | Self::PotentialXssAttempt
                | Self::PotentialApiAbuse
        )
    }
}

impl fmt::Display for SecurityEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityEventType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOGIN_SUCCESS" => Ok(Self::LoginSuccess),
            "LOGIN_FAILED" => Ok(Self::LoginFailed),
            "LOGOUT" => Ok(Self::Logout),
            "SIGNUP_SUCCESS" => Ok(Self::SignupSuccess),
            "SIGNUP_FAILED" => Ok(Self::SignupFailed),
            "SUSPICIOUS_ACTIVITY" => Ok(Self::SuspiciousActivity),
            "ACCESS_GRANTED" => Ok(Self::AccessGranted),
            "ACCESS_DENIED" => Ok(Self::AccessDenied),
            "SESSION_START" => Ok(Self::SessionStart),
            "SESSION_END" => Ok(Self::SessionEnd),
            "SESSION_ACTIVE" => Ok(Self::SessionActive),
            "SESSION_INACTIVE" => Ok(Self::SessionInactive),
            "POTENTIAL_XSS_ATTEMPT" => Ok(Self::PotentialXssAttempt),
            "POTENTIAL_API_ABUSE" => Ok(Self::PotentialApiAbuse),
            _ => Err(AppError::invalid_input(format!("Unknown security event type: {s}")).into()),
        }
    }
}

/// A recorded security event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    /// Unique event identifier
    pub id: Uuid,
    /// User the event concerns, when known
    pub user_id: Option<Uuid>,
    /// Type of security event
    pub event_type: SecurityEventType,
    /// Additional event context
    pub event_data: Option<serde_json::Value>,
    /// Source IP address (if available)
    pub ip_address: Option<String>,
    /// User agent string (if available)
    pub user_agent: Option<String>,
    /// Timestamp of the event
    pub created_at: DateTime<Utc>,
}

impl SecurityEvent {
    /// Create a new security event
    #[must_use]
    pub fn new(event_type: SecurityEventType) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            event_type,
            event_data: None,
            ip_address: None,
            user_agent: None,
            created_at: Utc::now(),
        }
    }

    /// Set the user the event concerns
    #[must_use]
    pub const fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Attach additional event context
    #[must_use]
    pub fn with_event_data(mut self, event_data: serde_json::Value) -> Self {
        self.event_data = Some(event_data);
        self
    }

    /// Set the source IP address
    #[must_use]
    pub fn with_ip_address(mut self, ip_address: String) -> Self {
        self.ip_address = Some(ip_address);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = Some(user_agent);
        self
    }
}

/// Records security events to the log and the database
#[derive(Clone)]
pub struct SecurityMonitor {
    database: Arc<Database>,
}

impl SecurityMonitor {
    /// Create a new security monitor
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Record a security event
    ///
    /// Storage failures are logged and swallowed so that a broken audit
    /// trail never fails the request that produced the event.
    pub async fn log_event(&self, event: SecurityEvent) {
        if event.event_type.is_alert() {
            tracing::warn!(
                event_id = %event.id,
                event_type = %event.event_type,
                user_id = ?event.user_id,
                ip_address = ?event.ip_address,
                "Security event: {}",
                event.event_type
            );
        } else {
            tracing::info!(
                event_id = %event.id,
                event_type = %event.event_type,
                user_id = ?event.user_id,
                "Security event: {}",
                event.event_type
            );
        }

        if let Err(e) = self.database.record_security_event(&event).await {
            tracing::error!("Failed to store security event {}: {e}", event.id);
        }
    }

    /// Record an authentication outcome
    pub async fn log_auth_event(
        &self,
        event_type: SecurityEventType,
        user_id: Option<Uuid>,
        email: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) {
        let mut event =
            SecurityEvent::new(event_type).with_event_data(serde_json::json!({ "email": email }));

        if let Some(user_id) = user_id {
            event = event.with_user_id(user_id);
        }

        if let Some(ip) = ip_address {
            event = event.with_ip_address(ip);
        }

        if let Some(agent) = user_agent {
            event = event.with_user_agent(agent);
        }

        self.log_event(event).await;
    }
}
