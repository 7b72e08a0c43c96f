// ABOUTME: HTTP server wiring for the Savora API
// ABOUTME: Builds the shared resource graph, composes the router, and runs the listener
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::llm::ChatProvider;
use crate::middleware::{setup_cors, AuthMiddleware};
use crate::rate_limiting::FixedWindowLimiter;
use crate::recipes::RecipeGenerator;
use crate::routes::{
    AuthRoutes, HealthRoutes, ProfileRoutes, RecipeRoutes, ReferenceRoutes, SecurityRoutes,
    ShoppingListRoutes,
};
use crate::security::SecurityMonitor;

/// Centralized resource container for dependency injection
///
/// Holds all shared server state so route handlers clone one Arc instead
/// of rebuilding managers per request.
#[derive(Clone)]
pub struct ServerResources {
    /// Shared database handle
    pub database: Arc<Database>,
    /// Token issuing and validation
    pub auth_manager: Arc<AuthManager>,
    /// Bearer token authentication middleware
    pub auth_middleware: Arc<AuthMiddleware>,
    /// Recipe generation pipeline
    pub recipe_generator: Arc<RecipeGenerator>,
    /// Security event sink
    pub security_monitor: Arc<SecurityMonitor>,
    /// Login and registration attempt limiter
    pub auth_limiter: Arc<FixedWindowLimiter>,
    /// Recipe generation limiter
    pub generation_limiter: Arc<FixedWindowLimiter>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Build the shared resource graph
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the LLM provider cannot be
    /// constructed from `config.llm`.
    pub fn new(
        database: Database,
        auth_manager: AuthManager,
        config: Arc<ServerConfig>,
    ) -> AppResult<Self> {
        let database = Arc::new(database);
        let auth_manager = Arc::new(auth_manager);
        let auth_middleware = Arc::new(AuthMiddleware::new(
            Arc::clone(&auth_manager),
            Arc::clone(&database),
        ));

        let provider = Arc::new(ChatProvider::from_config(&config.llm)?);
        let recipe_generator = Arc::new(RecipeGenerator::new(
            provider,
            Arc::clone(&database),
            &config.llm,
        ));

        let security_monitor = Arc::new(SecurityMonitor::new(Arc::clone(&database)));
        let auth_limiter = Arc::new(FixedWindowLimiter::from_config(config.rate_limits.auth));
        let generation_limiter = Arc::new(FixedWindowLimiter::from_config(
            config.rate_limits.generation,
        ));

        Ok(Self {
            database,
            auth_manager,
            auth_middleware,
            recipe_generator,
            security_monitor,
            auth_limiter,
            generation_limiter,
            config,
        })
    }
}

/// HTTP server for the Savora API
pub struct HttpServer {
    resources: Arc<ServerResources>,
}

impl HttpServer {
    /// Create a server around the shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Compose the full API router with CORS and request tracing
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .merge(HealthRoutes::routes(Arc::clone(&self.resources)))
            .merge(AuthRoutes::routes(Arc::clone(&self.resources)))
            .merge(ProfileRoutes::routes(Arc::clone(&self.resources)))
            .merge(ReferenceRoutes::routes(Arc::clone(&self.resources)))
            .merge(RecipeRoutes::routes(Arc::clone(&self.resources)))
            .merge(ShoppingListRoutes::routes(Arc::clone(&self.resources)))
            .merge(SecurityRoutes::routes(Arc::clone(&self.resources)))
            .layer(setup_cors(&self.resources.config))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the listener and serve until shutdown
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be bound or the server fails
    /// while running.
    pub async fn run(self, port: u16) -> AppResult<()> {
        let router = self.router();
        let address = format!("0.0.0.0:{port}");
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {address}: {e}")))?;
        info!("Savora API listening on {address}");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::internal(format!("HTTP server error: {e}")))?;

        info!("Server shut down cleanly");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install shutdown signal handler: {e}");
        return;
    }
    info!("Received shutdown signal");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_resources;

    #[tokio::test]
    async fn resource_graph_builds_from_test_config() {
        let resources = test_resources().await.unwrap();
        assert!(resources.config.rate_limits.enabled);
        assert_eq!(
            resources.auth_limiter.max_attempts(),
            resources.config.rate_limits.auth.max_attempts
        );
    }

    #[tokio::test]
    async fn router_composes_all_route_groups() {
        let resources = test_resources().await.unwrap();

        // Router construction panics on route conflicts, so building it is the test
        let _router = HttpServer::new(resources).router();
    }
}
