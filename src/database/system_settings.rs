// ABOUTME: System settings database operations for server-managed values
// ABOUTME: Provides get/set operations plus first-boot secret provisioning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

use super::Database;
use crate::auth::generate_jwt_secret;
use crate::errors::{AppError, AppResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::Row;

/// A system setting entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSetting {
    /// Unique key identifier for the setting
    pub key: String,
    /// The current value of the setting
    pub value: String,
    /// Human-readable description of what this setting controls
    pub description: Option<String>,
    /// When the setting was last modified
    pub updated_at: chrono::DateTime<Utc>,
}

impl Database {
    /// Create the system_settings table
    pub(super) async fn migrate_system_settings(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS system_settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a system setting by key
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_system_setting(&self, key: &str) -> AppResult<Option<SystemSetting>> {
        let row = sqlx::query(
            r"
            SELECT key, value, description, updated_at
            FROM system_settings
            WHERE key = ?1
            ",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get system setting: {e}")))?;

        row.map_or(Ok(None), |row| {
            let updated_at_str: String = row.get("updated_at");
            let updated_at = chrono::DateTime::parse_from_rfc3339(&updated_at_str)
                .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

            Ok(Some(SystemSetting {
                key: row.get("key"),
                value: row.get("value"),
                description: row.get("description"),
                updated_at,
            }))
        })
    }

    /// Set a system setting value
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn set_system_setting(&self, key: &str, value: &str) -> AppResult<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO system_settings (key, value, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = ?2,
                updated_at = ?3
            ",
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to set system setting: {e}")))?;

        Ok(())
    }

    /// Get a persisted secret, generating and storing one on first use
    ///
    /// Concurrent first calls race on the insert; `DO NOTHING` keeps the
    /// first writer's value and the read-back makes every caller agree.
    ///
    /// # Errors
    ///
    /// Returns an error if secret generation or storage fails
    pub async fn get_or_create_system_secret(&self, key: &str) -> AppResult<String> {
        if let Some(setting) = self.get_system_setting(key).await? {
            return Ok(setting.value);
        }

        let secret = generate_jwt_secret()?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO system_settings (key, value, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(key) DO NOTHING
            ",
        )
        .bind(key)
        .bind(&secret)
        .bind("Machine-generated signing secret")
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to store system secret: {e}")))?;

        let winner = self.get_system_setting(key).await?;
        Ok(winner.map_or(secret, |setting| setting.value))
    }
}
