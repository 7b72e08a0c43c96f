// ABOUTME: Security event reporting endpoints and request metadata extraction
// ABOUTME: Lets authenticated clients report browser-side security events and review their history
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::constants::limits;
use crate::errors::AppError;
use crate::security::{SecurityEvent, SecurityEventType};
use crate::server::ServerResources;

/// Client-reported security event payload
#[derive(Debug, Deserialize)]
pub struct ReportEventRequest {
    /// Event type name, e.g. "SESSION_ACTIVE"
    pub event_type: String,
    /// Optional structured event detail
    #[serde(default)]
    pub event_data: Option<Value>,
}

/// Query parameters for the event listing
#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    /// Maximum number of events to return
    pub limit: Option<u32>,
}

/// Security routes implementation
pub struct SecurityRoutes;

impl SecurityRoutes {
    /// Create all security event routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/security/events", post(Self::report_event))
            .route("/api/security/events", get(Self::list_events))
            .with_state(resources)
    }

    /// Record a security event reported by the client
    async fn report_event(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        peer: Option<ConnectInfo<SocketAddr>>,
        Json(request): Json<ReportEventRequest>,
    ) -> Result<impl IntoResponse, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let event_type: SecurityEventType = request.event_type.parse()?;
        let mut event = SecurityEvent::new(event_type).with_user_id(auth.user.id);
        if let Some(data) = request.event_data {
            event = event.with_event_data(data);
        }
        if let Some(ip) = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr)) {
            event = event.with_ip_address(ip);
        }
        if let Some(agent) = user_agent(&headers) {
            event = event.with_user_agent(agent);
        }

        let event_id = event.id;
        resources.security_monitor.log_event(event).await;

        Ok((
            StatusCode::CREATED,
            Json(serde_json::json!({
                "event_id": event_id,
                "message": "Security event recorded",
            })),
        ))
    }

    /// List the authenticated user's recent security events
    async fn list_events(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListEventsQuery>,
    ) -> Result<Json<Vec<SecurityEvent>>, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request(&headers)
            .await?;

        let limit = query
            .limit
            .unwrap_or(limits::DEFAULT_PAGE_SIZE)
            .min(limits::MAX_PAGE_SIZE);
        let events = resources
            .database
            .list_security_events(auth.user.id, limit)
            .await?;
        Ok(Json(events))
    }
}

/// Best-effort client IP: the first X-Forwarded-For hop, else the peer address
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

/// The request's User-Agent header when present
pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
}
