// ABOUTME: Profile and dietary-link database operations
// ABOUTME: Handles profile upserts plus user allergy and deficiency links

use chrono::{NaiveDate, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Profile, Severity, UserAllergy, UserDeficiency};

/// Partial profile update; `None` fields keep their stored value
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// Unique handle
    pub username: Option<String>,
    /// Full name
    pub full_name: Option<String>,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    /// Short biography
    pub bio: Option<String>,
}

impl Database {
    /// Create the profiles table and the dietary link tables
    pub(super) async fn migrate_profiles(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                username TEXT UNIQUE,
                full_name TEXT,
                avatar_url TEXT,
                bio TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_allergies (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                allergy_id TEXT NOT NULL REFERENCES allergies(id) ON DELETE CASCADE,
                severity TEXT NOT NULL DEFAULT 'mild' CHECK (severity IN ('mild', 'moderate', 'severe')),
                notes TEXT,
                created_at TEXT NOT NULL,
                UNIQUE(user_id, allergy_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_deficiencies (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                deficiency_id TEXT NOT NULL REFERENCES deficiencies(id) ON DELETE CASCADE,
                severity TEXT NOT NULL DEFAULT 'mild' CHECK (severity IN ('mild', 'moderate', 'severe')),
                notes TEXT,
                diagnosed_date TEXT,
                created_at TEXT NOT NULL,
                UNIQUE(user_id, deficiency_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_user_allergies_user ON user_allergies(user_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_user_deficiencies_user ON user_deficiencies(user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a user's profile
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let row = sqlx::query(
            r"
            SELECT user_id, username, full_name, avatar_url, bio, created_at, updated_at
            FROM profiles WHERE user_id = ?1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map_or(Ok(None), |row| Self::row_to_profile(&row).map(Some))
    }

    /// Create or partially update a user's profile
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` when the username is taken by
    /// another user, or a database error when the upsert fails.
    pub async fn upsert_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> AppResult<Profile> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO profiles (user_id, username, full_name, avatar_url, bio, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(user_id) DO UPDATE SET
                username = COALESCE(?2, profiles.username),
                full_name = COALESCE(?3, profiles.full_name),
                avatar_url = COALESCE(?4, profiles.avatar_url),
                bio = COALESCE(?5, profiles.bio),
                updated_at = ?6
            ",
        )
        .bind(user_id.to_string())
        .bind(&update.username)
        .bind(&update.full_name)
        .bind(&update.avatar_url)
        .bind(&update.bio)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::already_exists("Username is already taken")
            }
            _ => AppError::from(e),
        })?;

        self.get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::database("Profile upsert did not persist"))
    }

    fn row_to_profile(row: &sqlx::sqlite::SqliteRow) -> AppResult<Profile> {
        let user_id: String = row.try_get("user_id")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(Profile {
            user_id: parse_uuid(&user_id, "profiles.user_id")?,
            username: row.try_get("username")?,
            full_name: row.try_get("full_name")?,
            avatar_url: row.try_get("avatar_url")?,
            bio: row.try_get("bio")?,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    /// List a user's allergy links joined with the catalog names
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_user_allergies(&self, user_id: Uuid) -> AppResult<Vec<UserAllergy>> {
        let rows = sqlx::query(
            r"
            SELECT ua.id, ua.user_id, ua.allergy_id, a.name AS allergy_name,
                   ua.severity, ua.notes, ua.created_at
            FROM user_allergies ua
            JOIN allergies a ON a.id = ua.allergy_id
            WHERE ua.user_id = ?1
            ORDER BY a.name
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_user_allergy).collect()
    }

    /// Link an allergy catalog entry to a user
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown allergy id,
    /// `ResourceAlreadyExists` for a duplicate link, or a database error.
    pub async fn add_user_allergy(
        &self,
        user_id: Uuid,
        allergy_id: Uuid,
        severity: Severity,
        notes: Option<String>,
    ) -> AppResult<UserAllergy> {
        let allergy = self
            .get_allergy(allergy_id)
            .await?
            .ok_or_else(|| AppError::not_found("Allergy"))?;

        let id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            r"
            INSERT INTO user_allergies (id, user_id, allergy_id, severity, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(allergy_id.to_string())
        .bind(severity.as_str())
        .bind(&notes)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::already_exists("Allergy is already linked to this profile")
            }
            _ => AppError::from(e),
        })?;

        Ok(UserAllergy {
            id,
            user_id,
            allergy_id,
            allergy_name: allergy.name,
            severity,
            notes,
            created_at,
        })
    }

    /// Remove an allergy link by its link id
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the link does not exist or belongs
    /// to another user.
    pub async fn remove_user_allergy(&self, user_id: Uuid, link_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM user_allergies WHERE id = ?1 AND user_id = ?2")
            .bind(link_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Allergy link"));
        }
        Ok(())
    }

    fn row_to_user_allergy(row: &sqlx::sqlite::SqliteRow) -> AppResult<UserAllergy> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let allergy_id: String = row.try_get("allergy_id")?;
        let severity: String = row.try_get("severity")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(UserAllergy {
            id: parse_uuid(&id, "user_allergies.id")?,
            user_id: parse_uuid(&user_id, "user_allergies.user_id")?,
            allergy_id: parse_uuid(&allergy_id, "user_allergies.allergy_id")?,
            allergy_name: row.try_get("allergy_name")?,
            severity: severity.parse()?,
            notes: row.try_get("notes")?,
            created_at: parse_timestamp(&created_at),
        })
    }

    /// List a user's deficiency links joined with the catalog names
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_user_deficiencies(&self, user_id: Uuid) -> AppResult<Vec<UserDeficiency>> {
        let rows = sqlx::query(
            r"
            SELECT ud.id, ud.user_id, ud.deficiency_id, d.name AS deficiency_name,
                   ud.severity, ud.notes, ud.diagnosed_date, ud.created_at
            FROM user_deficiencies ud
            JOIN deficiencies d ON d.id = ud.deficiency_id
            WHERE ud.user_id = ?1
            ORDER BY d.name
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_user_deficiency).collect()
    }

    /// Link a deficiency catalog entry to a user
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown deficiency id,
    /// `ResourceAlreadyExists` for a duplicate link, or a database error.
    pub async fn add_user_deficiency(
        &self,
        user_id: Uuid,
        deficiency_id: Uuid,
        severity: Severity,
        notes: Option<String>,
        diagnosed_date: Option<NaiveDate>,
    ) -> AppResult<UserDeficiency> {
        let deficiency = self
            .get_deficiency(deficiency_id)
            .await?
            .ok_or_else(|| AppError::not_found("Deficiency"))?;

        let id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            r"
            INSERT INTO user_deficiencies (id, user_id, deficiency_id, severity, notes, diagnosed_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(deficiency_id.to_string())
        .bind(severity.as_str())
        .bind(&notes)
        .bind(diagnosed_date.map(|d| d.to_string()))
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::already_exists("Deficiency is already linked to this profile")
            }
            _ => AppError::from(e),
        })?;

        Ok(UserDeficiency {
            id,
            user_id,
            deficiency_id,
            deficiency_name: deficiency.name,
            severity,
            notes,
            diagnosed_date,
            created_at,
        })
    }

    /// Remove a deficiency link by its link id
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the link does not exist or belongs
    /// to another user.
    pub async fn remove_user_deficiency(&self, user_id: Uuid, link_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM user_deficiencies WHERE id = ?1 AND user_id = ?2")
            .bind(link_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Deficiency link"));
        }
        Ok(())
    }

    fn row_to_user_deficiency(row: &sqlx::sqlite::SqliteRow) -> AppResult<UserDeficiency> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let deficiency_id: String = row.try_get("deficiency_id")?;
        let severity: String = row.try_get("severity")?;
        let diagnosed_date: Option<String> = row.try_get("diagnosed_date")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(UserDeficiency {
            id: parse_uuid(&id, "user_deficiencies.id")?,
            user_id: parse_uuid(&user_id, "user_deficiencies.user_id")?,
            deficiency_id: parse_uuid(&deficiency_id, "user_deficiencies.deficiency_id")?,
            deficiency_name: row.try_get("deficiency_name")?,
            severity: severity.parse()?,
            notes: row.try_get("notes")?,
            diagnosed_date: diagnosed_date.and_then(|s| s.parse().ok()),
            created_at: parse_timestamp(&created_at),
        })
    }
}
