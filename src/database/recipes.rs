// ABOUTME: Recipe persistence and favorites database operations
// ABOUTME: Handles recipe storage, visibility, listing, and bookmarks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_string_array, parse_timestamp, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Favorite, Recipe};

const RECIPE_COLUMNS: &str = "id, user_id, title, description, ingredients, instructions, \
     nutrition_info, shopping_list, allergen_warnings, nutritional_benefits, cook_time, \
     servings, difficulty, cuisine_type, dietary_preferences, is_public, tags, created_at, \
     updated_at";

impl Database {
    /// Create the recipes and favorites tables
    pub(super) async fn migrate_recipes(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS recipes (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                ingredients TEXT NOT NULL DEFAULT '[]',
                instructions TEXT NOT NULL DEFAULT '[]',
                nutrition_info TEXT NOT NULL,
                shopping_list TEXT NOT NULL DEFAULT '[]',
                allergen_warnings TEXT NOT NULL DEFAULT '[]',
                nutritional_benefits TEXT NOT NULL DEFAULT '[]',
                cook_time TEXT NOT NULL,
                servings INTEGER NOT NULL,
                difficulty TEXT NOT NULL DEFAULT 'Medium' CHECK (difficulty IN ('Easy', 'Medium', 'Hard')),
                cuisine_type TEXT,
                dietary_preferences TEXT,
                is_public BOOLEAN NOT NULL DEFAULT 0,
                tags TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS favorites (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                recipe_id TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                notes TEXT,
                created_at TEXT NOT NULL,
                UNIQUE(user_id, recipe_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_recipes_user_id ON recipes(user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_recipes_created_at ON recipes(created_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_favorites_user_id ON favorites(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Persist a recipe
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_recipe(&self, recipe: &Recipe) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO recipes (
                id, user_id, title, description, ingredients, instructions, nutrition_info,
                shopping_list, allergen_warnings, nutritional_benefits, cook_time, servings,
                difficulty, cuisine_type, dietary_preferences, is_public, tags, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            ",
        )
        .bind(recipe.id.to_string())
        .bind(recipe.user_id.to_string())
        .bind(&recipe.title)
        .bind(&recipe.description)
        .bind(serde_json::json!(&recipe.ingredients).to_string())
        .bind(serde_json::json!(&recipe.instructions).to_string())
        .bind(serde_json::json!(&recipe.nutrition_info).to_string())
        .bind(serde_json::json!(&recipe.shopping_list).to_string())
        .bind(serde_json::json!(&recipe.allergen_warnings).to_string())
        .bind(serde_json::json!(&recipe.nutritional_benefits).to_string())
        .bind(&recipe.cook_time)
        .bind(recipe.servings)
        .bind(recipe.difficulty.as_str())
        .bind(&recipe.cuisine_type)
        .bind(recipe.dietary_preferences.as_ref().map(ToString::to_string))
        .bind(recipe.is_public)
        .bind(serde_json::json!(&recipe.tags).to_string())
        .bind(recipe.created_at.to_rfc3339())
        .bind(recipe.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(recipe.id)
    }

    /// Get a recipe visible to the given user (their own or a public one)
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_recipe(&self, recipe_id: Uuid, user_id: Uuid) -> AppResult<Option<Recipe>> {
        let query = format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?1 AND (user_id = ?2 OR is_public = 1)"
        );

        let row = sqlx::query(&query)
            .bind(recipe_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map_or(Ok(None), |row| Self::row_to_recipe(&row).map(Some))
    }

    /// List a user's recipes, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_recipes_for_user(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> AppResult<Vec<Recipe>> {
        let query = format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE user_id = ?1 \
             ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
        );

        let rows = sqlx::query(&query)
            .bind(user_id.to_string())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_recipe).collect()
    }

    /// Delete a recipe the user owns, along with any favorites of it
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the recipe does not exist or is
    /// owned by someone else.
    pub async fn delete_recipe(&self, recipe_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM recipes WHERE id = ?1 AND user_id = ?2")
            .bind(recipe_id.to_string())
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Recipe"));
        }

        // Favorites pointing at the recipe go with it
        sqlx::query("DELETE FROM favorites WHERE recipe_id = ?1")
            .bind(recipe_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Bookmark a recipe for a user
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the recipe is not visible to the
    /// user, `ResourceAlreadyExists` when already bookmarked.
    pub async fn add_favorite(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        notes: Option<String>,
    ) -> AppResult<Favorite> {
        if self.get_recipe(recipe_id, user_id).await?.is_none() {
            return Err(AppError::not_found("Recipe"));
        }

        let favorite = Favorite {
            id: Uuid::new_v4(),
            user_id,
            recipe_id,
            notes,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO favorites (id, user_id, recipe_id, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(favorite.id.to_string())
        .bind(favorite.user_id.to_string())
        .bind(favorite.recipe_id.to_string())
        .bind(&favorite.notes)
        .bind(favorite.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::already_exists("Recipe is already in favorites")
            }
            _ => AppError::from(e),
        })?;

        Ok(favorite)
    }

    /// Remove a recipe bookmark
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the favorite does not exist.
    pub async fn remove_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = ?1 AND recipe_id = ?2")
            .bind(user_id.to_string())
            .bind(recipe_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Favorite"));
        }
        Ok(())
    }

    /// List the recipes a user has bookmarked, most recently favorited first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<Recipe>> {
        let rows = sqlx::query(
            r"
            SELECT r.id, r.user_id, r.title, r.description, r.ingredients, r.instructions,
                   r.nutrition_info, r.shopping_list, r.allergen_warnings, r.nutritional_benefits,
                   r.cook_time, r.servings, r.difficulty, r.cuisine_type, r.dietary_preferences,
                   r.is_public, r.tags, r.created_at, r.updated_at
            FROM recipes r
            JOIN favorites f ON f.recipe_id = r.id
            WHERE f.user_id = ?1
            ORDER BY f.created_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_recipe).collect()
    }

    /// Convert a database row to a Recipe struct
    fn row_to_recipe(row: &sqlx::sqlite::SqliteRow) -> AppResult<Recipe> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let ingredients: String = row.try_get("ingredients")?;
        let instructions: String = row.try_get("instructions")?;
        let nutrition_info: String = row.try_get("nutrition_info")?;
        let shopping_list: String = row.try_get("shopping_list")?;
        let allergen_warnings: String = row.try_get("allergen_warnings")?;
        let nutritional_benefits: String = row.try_get("nutritional_benefits")?;
        let difficulty: String = row.try_get("difficulty")?;
        let dietary_preferences: Option<String> = row.try_get("dietary_preferences")?;
        let tags: String = row.try_get("tags")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(Recipe {
            id: parse_uuid(&id, "recipes.id")?,
            user_id: parse_uuid(&user_id, "recipes.user_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            ingredients: parse_string_array(&ingredients),
            instructions: parse_string_array(&instructions),
            nutrition_info: serde_json::from_str(&nutrition_info)
                .map_err(|e| AppError::database(format!("Invalid nutrition_info JSON: {e}")))?,
            shopping_list: parse_string_array(&shopping_list),
            allergen_warnings: parse_string_array(&allergen_warnings),
            nutritional_benefits: parse_string_array(&nutritional_benefits),
            cook_time: row.try_get("cook_time")?,
            servings: row.try_get("servings")?,
            difficulty: difficulty.parse()?,
            cuisine_type: row.try_get("cuisine_type")?,
            dietary_preferences: dietary_preferences.and_then(|s| serde_json::from_str(&s).ok()),
            is_public: row.try_get("is_public")?,
            tags: parse_string_array(&tags),
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }
}
