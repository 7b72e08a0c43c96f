// ABOUTME: User account database operations
// ABOUTME: Handles registration, lookup, and activity tracking

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::User;

impl Database {
    /// Create the users table and its indexes
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                display_name TEXT,
                password_hash TEXT NOT NULL,
                user_status TEXT NOT NULL DEFAULT 'active' CHECK (user_status IN ('pending', 'active', 'suspended')),
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                last_active TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_is_active ON users(is_active)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create a new user account
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` when the email is taken, or a
    /// database error when the insert fails.
    pub async fn create_user(&self, user: &User) -> AppResult<Uuid> {
        if self.get_user_by_email(&user.email).await?.is_some() {
            return Err(AppError::already_exists("Email is already registered"));
        }

        sqlx::query(
            r"
            INSERT INTO users (id, email, display_name, password_hash, user_status, is_active, created_at, last_active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.user_status.to_string())
        .bind(user.is_active)
        .bind(user.created_at.to_rfc3339())
        .bind(user.last_active.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(user.id)
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        self.get_user_impl("id", &user_id.to_string()).await
    }

    /// Get a user by email
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.get_user_impl("email", email).await
    }

    /// Get a user by email, returning an error if not found
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when no account has this email, or a
    /// database error when the query fails.
    pub async fn get_user_by_email_required(&self, email: &str) -> AppResult<User> {
        self.get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Internal implementation for getting a user
    async fn get_user_impl(&self, field: &str, value: &str) -> AppResult<Option<User>> {
        let query = format!(
            r"
            SELECT id, email, display_name, password_hash, user_status, is_active, created_at, last_active
            FROM users WHERE {field} = ?1
            "
        );

        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map_or(Ok(None), |row| Self::row_to_user(&row).map(Some))
    }

    /// Convert a database row to a User struct
    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> AppResult<User> {
        let id: String = row.try_get("id")?;
        let user_status: String = row.try_get("user_status")?;
        let created_at: String = row.try_get("created_at")?;
        let last_active: String = row.try_get("last_active")?;

        Ok(User {
            id: parse_uuid(&id, "users.id")?,
            email: row.try_get("email")?,
            display_name: row.try_get("display_name")?,
            password_hash: row.try_get("password_hash")?,
            user_status: user_status.parse()?,
            is_active: row.try_get("is_active")?,
            created_at: parse_timestamp(&created_at),
            last_active: parse_timestamp(&last_active),
        })
    }

    /// Update user's last active timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn update_last_active(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_active = ?1 WHERE id = ?2")
            .bind(Utc::now().to_rfc3339())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[tokio::test]
    async fn create_and_fetch_user() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let user = User::new(
            "maya@example.com".to_owned(),
            "$2b$12$hash".to_owned(),
            Some("Maya".to_owned()),
        );

        let id = db.create_user(&user).await.unwrap();
        assert_eq!(id, user.id);

        let by_id = db.get_user(id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "maya@example.com");
        assert_eq!(by_id.display_name.as_deref(), Some("Maya"));
        assert!(by_id.can_login());

        let by_email = db.get_user_by_email("maya@example.com").await.unwrap();
        assert!(by_email.is_some());
        assert!(db.get_user_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let first = User::new("dup@example.com".to_owned(), "hash-a".to_owned(), None);
        let second = User::new("dup@example.com".to_owned(), "hash-b".to_owned(), None);

        db.create_user(&first).await.unwrap();
        let err = db.create_user(&second).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);
    }

    #[tokio::test]
    async fn required_lookup_errors_when_missing() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let err = db
            .get_user_by_email_required("ghost@example.com")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceNotFound);
    }

    #[tokio::test]
    async fn last_active_moves_forward() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let mut user = User::new("active@example.com".to_owned(), "hash".to_owned(), None);
        user.last_active = user.last_active - chrono::Duration::hours(2);
        db.create_user(&user).await.unwrap();

        db.update_last_active(user.id).await.unwrap();
        let reloaded = db.get_user(user.id).await.unwrap().unwrap();
        assert!(reloaded.last_active > user.last_active);
    }
}
