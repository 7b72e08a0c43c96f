// ABOUTME: Production entry point for the Savora nutrition API server
// ABOUTME: Loads configuration, bootstraps the JWT secret, and serves the HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

//! # Savora Server Binary
//!
//! Starts the HTTP API with email/password authentication, SQLite
//! persistence, and LLM-backed recipe generation. Configuration comes from
//! environment variables; the JWT signing secret is generated on first run
//! and persisted in the database so restarts keep sessions valid.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use savora_server::auth::AuthManager;
use savora_server::config::environment::ServerConfig;
use savora_server::constants::system_settings;
use savora_server::database::Database;
use savora_server::logging;
use savora_server::server::{HttpServer, ServerResources};

#[derive(Parser)]
#[command(name = "savora-server")]
#[command(about = "Savora Nutrition API - personalized recipe generation backend")]
#[command(version)]
struct Args {
    /// Override the HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override the database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("Starting Savora Nutrition API");
    info!("{}", config.summary());

    let database_url = args
        .database_url
        .unwrap_or_else(|| config.database.url.to_connection_string());
    let database = Database::new(&database_url).await?;
    info!("Database initialized: {database_url}");

    // The signing secret survives restarts via the system_settings table,
    // unless the deployment pins one through JWT_SECRET
    let jwt_secret = match config.auth.jwt_secret.clone() {
        Some(secret) => secret,
        None => {
            database
                .get_or_create_system_secret(system_settings::JWT_SECRET_KEY)
                .await?
        }
    };
    let auth_manager = AuthManager::from_base64_secret(&jwt_secret, config.auth.jwt_expiry_hours)?;
    info!("Authentication manager initialized");

    let port = config.http_port;
    let resources = Arc::new(ServerResources::new(
        database,
        auth_manager,
        Arc::new(config),
    )?);

    display_available_endpoints(port);

    HttpServer::new(resources).run(port).await?;
    Ok(())
}

fn display_available_endpoints(port: u16) {
    info!("Savora API available at http://localhost:{port}");
    info!("  Health:         GET  /health, GET /ready");
    info!("  Auth:           POST /api/auth/register, /api/auth/login, /api/auth/refresh");
    info!("  Profile:        GET/PUT /api/profile, /api/profile/allergies, /api/profile/deficiencies");
    info!("  Reference:      GET  /api/reference/allergies, /api/reference/deficiencies, /api/reference/ingredients");
    info!("  Recipes:        POST /api/recipes/generate, GET /api/recipes, GET /api/recipes/favorites");
    info!("  Shopping lists: CRUD /api/shopping-lists");
    info!("  Security:       POST/GET /api/security/events");
}
