// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Database Management
//!
//! SQLite persistence for users, profiles, reference catalogs, recipes,
//! shopping lists, and security events. Migrations are plain
//! `CREATE TABLE IF NOT EXISTS` statements run at startup, and the
//! reference catalogs are seeded idempotently right after.

mod profiles;
mod recipes;
mod reference;
mod security_events;
mod shopping_lists;
mod system_settings;
mod users;

pub use profiles::ProfileUpdate;
pub use shopping_lists::{NewShoppingListItem, ShoppingListItemUpdate};
pub use system_settings::SystemSetting;

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Database manager for all persistent state
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to SQLite, run migrations, and seed the reference catalogs
    ///
    /// # Errors
    ///
    /// Returns an error when the connection cannot be opened or a
    /// migration statement fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:")
            && !database_url.contains(":memory:")
            && !database_url.contains('?')
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        db.seed_reference_data().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Cheap liveness probe used by the readiness endpoint
    ///
    /// # Errors
    ///
    /// Returns an error when the pool cannot execute a trivial query.
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error when any table or index creation fails.
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        // Reference catalogs come before the link tables that reference them
        self.migrate_reference().await?;
        self.migrate_profiles().await?;
        self.migrate_recipes().await?;
        self.migrate_shopping_lists().await?;
        self.migrate_security_events().await?;
        self.migrate_system_settings().await?;
        Ok(())
    }
}

/// Parse an RFC 3339 timestamp column, falling back to now for unreadable rows
fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

/// Parse a TEXT UUID column
fn parse_uuid(value: &str, column: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::database(format!("Invalid UUID in {column}: {e}")))
}

/// Parse a JSON array column of strings, treating unreadable rows as empty
fn parse_string_array(value: &str) -> Vec<String> {
    serde_json::from_str(value).unwrap_or_default()
}
