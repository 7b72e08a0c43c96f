// ABOUTME: Shopping list database operations
// ABOUTME: Handles lists plus their catalog-linked and free-text items
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{ShoppingList, ShoppingListItem, ShoppingListWithItems};

/// New item for a shopping list
///
/// Exactly one of `ingredient_id` and `custom_item_name` must be set.
#[derive(Debug, Clone, Default)]
pub struct NewShoppingListItem {
    pub ingredient_id: Option<Uuid>,
    pub custom_item_name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

/// Partial item update; `None` fields keep their stored value
#[derive(Debug, Clone, Default)]
pub struct ShoppingListItemUpdate {
    pub is_purchased: Option<bool>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

impl Database {
    /// Create the shopping list tables
    pub(super) async fn migrate_shopping_lists(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS shopping_lists (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT,
                is_completed BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS shopping_list_items (
                id TEXT PRIMARY KEY,
                shopping_list_id TEXT NOT NULL REFERENCES shopping_lists(id) ON DELETE CASCADE,
                ingredient_id TEXT REFERENCES ingredients(id),
                custom_item_name TEXT,
                quantity REAL,
                unit TEXT,
                is_purchased BOOLEAN NOT NULL DEFAULT 0,
                notes TEXT,
                created_at TEXT NOT NULL,
                CHECK ((ingredient_id IS NULL) != (custom_item_name IS NULL))
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_shopping_lists_user_id ON shopping_lists(user_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_shopping_list_items_list ON shopping_list_items(shopping_list_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create a shopping list for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_shopping_list(
        &self,
        user_id: Uuid,
        name: String,
        description: Option<String>,
    ) -> AppResult<ShoppingList> {
        let now = Utc::now();
        let list = ShoppingList {
            id: Uuid::new_v4(),
            user_id,
            name,
            description,
            is_completed: false,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r"
            INSERT INTO shopping_lists (id, user_id, name, description, is_completed, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(list.id.to_string())
        .bind(list.user_id.to_string())
        .bind(&list.name)
        .bind(&list.description)
        .bind(list.is_completed)
        .bind(list.created_at.to_rfc3339())
        .bind(list.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(list)
    }

    /// List a user's shopping lists, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_shopping_lists(&self, user_id: Uuid) -> AppResult<Vec<ShoppingList>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, name, description, is_completed, created_at, updated_at
            FROM shopping_lists
            WHERE user_id = ?1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_shopping_list).collect()
    }

    /// Get one of the user's shopping lists together with its items
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_shopping_list(
        &self,
        list_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<ShoppingListWithItems>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, name, description, is_completed, created_at, updated_at
            FROM shopping_lists
            WHERE id = ?1 AND user_id = ?2
            ",
        )
        .bind(list_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let list = Self::row_to_shopping_list(&row)?;

        let item_rows = sqlx::query(
            r"
            SELECT id, shopping_list_id, ingredient_id, custom_item_name, quantity, unit,
                   is_purchased, notes, created_at
            FROM shopping_list_items
            WHERE shopping_list_id = ?1
            ORDER BY created_at
            ",
        )
        .bind(list_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let items = item_rows
            .iter()
            .map(Self::row_to_shopping_list_item)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Some(ShoppingListWithItems { list, items }))
    }

    /// Delete a shopping list the user owns, along with its items
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the list does not exist or is owned
    /// by someone else.
    pub async fn delete_shopping_list(&self, list_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM shopping_lists WHERE id = ?1 AND user_id = ?2")
            .bind(list_id.to_string())
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Shopping list"));
        }

        sqlx::query("DELETE FROM shopping_list_items WHERE shopping_list_id = ?1")
            .bind(list_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Add an item to one of the user's shopping lists
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` unless exactly one of `ingredient_id` and
    /// `custom_item_name` is set, `ResourceNotFound` when the list or the
    /// referenced ingredient does not exist.
    pub async fn add_shopping_list_item(
        &self,
        list_id: Uuid,
        user_id: Uuid,
        item: &NewShoppingListItem,
    ) -> AppResult<ShoppingListItem> {
        match (item.ingredient_id, &item.custom_item_name) {
            (Some(_), Some(_)) | (None, None) => {
                return Err(AppError::invalid_input(
                    "Provide exactly one of ingredient_id or custom_item_name",
                ));
            }
            _ => {}
        }

        if !self.shopping_list_owned(list_id, user_id).await? {
            return Err(AppError::not_found("Shopping list"));
        }

        if let Some(ingredient_id) = item.ingredient_id {
            if self.get_ingredient(ingredient_id).await?.is_none() {
                return Err(AppError::not_found("Ingredient"));
            }
        }

        let stored = ShoppingListItem {
            id: Uuid::new_v4(),
            shopping_list_id: list_id,
            ingredient_id: item.ingredient_id,
            custom_item_name: item.custom_item_name.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            is_purchased: false,
            notes: item.notes.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO shopping_list_items (
                id, shopping_list_id, ingredient_id, custom_item_name, quantity, unit,
                is_purchased, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(stored.id.to_string())
        .bind(stored.shopping_list_id.to_string())
        .bind(stored.ingredient_id.map(|id| id.to_string()))
        .bind(&stored.custom_item_name)
        .bind(stored.quantity)
        .bind(&stored.unit)
        .bind(stored.is_purchased)
        .bind(&stored.notes)
        .bind(stored.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(stored)
    }

    /// Apply a partial update to an item on one of the user's lists
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the item is not on a list the user
    /// owns.
    pub async fn update_shopping_list_item(
        &self,
        list_id: Uuid,
        user_id: Uuid,
        item_id: Uuid,
        update: &ShoppingListItemUpdate,
    ) -> AppResult<ShoppingListItem> {
        let result = sqlx::query(
            r"
            UPDATE shopping_list_items
            SET is_purchased = COALESCE(?1, is_purchased),
                quantity = COALESCE(?2, quantity),
                unit = COALESCE(?3, unit),
                notes = COALESCE(?4, notes)
            WHERE id = ?5 AND shopping_list_id IN (
                SELECT id FROM shopping_lists WHERE id = ?6 AND user_id = ?7
            )
            ",
        )
        .bind(update.is_purchased)
        .bind(update.quantity)
        .bind(&update.unit)
        .bind(&update.notes)
        .bind(item_id.to_string())
        .bind(list_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Shopping list item"));
        }

        let row = sqlx::query(
            r"
            SELECT id, shopping_list_id, ingredient_id, custom_item_name, quantity, unit,
                   is_purchased, notes, created_at
            FROM shopping_list_items
            WHERE id = ?1
            ",
        )
        .bind(item_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_shopping_list_item(&row)
    }

    /// Mark an item on one of the user's lists as purchased or not
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the item is not on a list the user
    /// owns.
    pub async fn set_item_purchased(
        &self,
        list_id: Uuid,
        user_id: Uuid,
        item_id: Uuid,
        purchased: bool,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r"
            UPDATE shopping_list_items
            SET is_purchased = ?1
            WHERE id = ?2 AND shopping_list_id IN (
                SELECT id FROM shopping_lists WHERE id = ?3 AND user_id = ?4
            )
            ",
        )
        .bind(purchased)
        .bind(item_id.to_string())
        .bind(list_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Shopping list item"));
        }
        Ok(())
    }

    /// Remove an item from one of the user's lists
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the item is not on a list the user
    /// owns.
    pub async fn remove_shopping_list_item(
        &self,
        list_id: Uuid,
        user_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r"
            DELETE FROM shopping_list_items
            WHERE id = ?1 AND shopping_list_id IN (
                SELECT id FROM shopping_lists WHERE id = ?2 AND user_id = ?3
            )
            ",
        )
        .bind(item_id.to_string())
        .bind(list_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Shopping list item"));
        }
        Ok(())
    }

    async fn shopping_list_owned(&self, list_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM shopping_lists WHERE id = ?1 AND user_id = ?2")
            .bind(list_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Convert a database row to a ShoppingList struct
    fn row_to_shopping_list(row: &sqlx::sqlite::SqliteRow) -> AppResult<ShoppingList> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(ShoppingList {
            id: parse_uuid(&id, "shopping_lists.id")?,
            user_id: parse_uuid(&user_id, "shopping_lists.user_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            is_completed: row.try_get("is_completed")?,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    /// Convert a database row to a ShoppingListItem struct
    fn row_to_shopping_list_item(row: &sqlx::sqlite::SqliteRow) -> AppResult<ShoppingListItem> {
        let id: String = row.try_get("id")?;
        let shopping_list_id: String = row.try_get("shopping_list_id")?;
        let ingredient_id: Option<String> = row.try_get("ingredient_id")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(ShoppingListItem {
            id: parse_uuid(&id, "shopping_list_items.id")?,
            shopping_list_id: parse_uuid(&shopping_list_id, "shopping_list_items.shopping_list_id")?,
            ingredient_id: ingredient_id
                .as_deref()
                .map(|v| parse_uuid(v, "shopping_list_items.ingredient_id"))
                .transpose()?,
            custom_item_name: row.try_get("custom_item_name")?,
            quantity: row.try_get("quantity")?,
            unit: row.try_get("unit")?,
            is_purchased: row.try_get("is_purchased")?,
            notes: row.try_get("notes")?,
            created_at: parse_timestamp(&created_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::models::User;

    async fn user_in(db: &Database, email: &str) -> Uuid {
        let user = User::new(email.to_owned(), "hash".to_owned(), None);
        db.create_user(&user).await.unwrap()
    }

    async fn ingredient_id(db: &Database, name: &str) -> Uuid {
        db.list_ingredients()
            .await
            .unwrap()
            .into_iter()
            .find(|i| i.name == name)
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn list_round_trips_with_items() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let owner = user_in(&db, "groceries@example.com").await;
        let other = user_in(&db, "neighbor@example.com").await;

        let list = db
            .create_shopping_list(owner, "Weekly shop".to_owned(), Some("Sunday run".to_owned()))
            .await
            .unwrap();

        let spinach = ingredient_id(&db, "Spinach").await;
        db.add_shopping_list_item(
            list.id,
            owner,
            &NewShoppingListItem {
                ingredient_id: Some(spinach),
                quantity: Some(300.0),
                unit: Some("g".to_owned()),
                ..NewShoppingListItem::default()
            },
        )
        .await
        .unwrap();
        db.add_shopping_list_item(
            list.id,
            owner,
            &NewShoppingListItem {
                custom_item_name: Some("Paper towels".to_owned()),
                ..NewShoppingListItem::default()
            },
        )
        .await
        .unwrap();

        let loaded = db.get_shopping_list(list.id, owner).await.unwrap().unwrap();
        assert_eq!(loaded.list.name, "Weekly shop");
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.items[0].ingredient_id, Some(spinach));
        assert_eq!(loaded.items[1].custom_item_name.as_deref(), Some("Paper towels"));

        // Other users cannot see the list at all
        assert!(db.get_shopping_list(list.id, other).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn item_insert_enforces_exactly_one_source() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let owner = user_in(&db, "strict@example.com").await;
        let list = db
            .create_shopping_list(owner, "Rules".to_owned(), None)
            .await
            .unwrap();

        let both = NewShoppingListItem {
            ingredient_id: Some(Uuid::new_v4()),
            custom_item_name: Some("Duplicate source".to_owned()),
            ..NewShoppingListItem::default()
        };
        let err = db
            .add_shopping_list_item(list.id, owner, &both)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let neither = NewShoppingListItem::default();
        let err = db
            .add_shopping_list_item(list.id, owner, &neither)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let unknown = NewShoppingListItem {
            ingredient_id: Some(Uuid::new_v4()),
            ..NewShoppingListItem::default()
        };
        let err = db
            .add_shopping_list_item(list.id, owner, &unknown)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceNotFound);
    }

    #[tokio::test]
    async fn item_updates_merge_and_toggle_purchased() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let owner = user_in(&db, "updates@example.com").await;
        let list = db
            .create_shopping_list(owner, "Edits".to_owned(), None)
            .await
            .unwrap();

        let item = db
            .add_shopping_list_item(
                list.id,
                owner,
                &NewShoppingListItem {
                    custom_item_name: Some("Olive oil".to_owned()),
                    quantity: Some(1.0),
                    unit: Some("bottle".to_owned()),
                    notes: Some("extra virgin".to_owned()),
                    ..NewShoppingListItem::default()
                },
            )
            .await
            .unwrap();

        let updated = db
            .update_shopping_list_item(
                list.id,
                owner,
                item.id,
                &ShoppingListItemUpdate {
                    quantity: Some(2.0),
                    ..ShoppingListItemUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.quantity, Some(2.0));
        assert_eq!(updated.notes.as_deref(), Some("extra virgin"));
        assert!(!updated.is_purchased);

        db.set_item_purchased(list.id, owner, item.id, true)
            .await
            .unwrap();
        let loaded = db.get_shopping_list(list.id, owner).await.unwrap().unwrap();
        assert!(loaded.items[0].is_purchased);
    }

    #[tokio::test]
    async fn item_operations_are_owner_scoped() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let owner = user_in(&db, "mine@example.com").await;
        let other = user_in(&db, "theirs@example.com").await;
        let list = db
            .create_shopping_list(owner, "Guarded".to_owned(), None)
            .await
            .unwrap();
        let item = db
            .add_shopping_list_item(
                list.id,
                owner,
                &NewShoppingListItem {
                    custom_item_name: Some("Coffee".to_owned()),
                    ..NewShoppingListItem::default()
                },
            )
            .await
            .unwrap();

        let err = db
            .set_item_purchased(list.id, other, item.id, true)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceNotFound);

        let err = db
            .remove_shopping_list_item(list.id, other, item.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceNotFound);

        db.remove_shopping_list_item(list.id, owner, item.id)
            .await
            .unwrap();
        let err = db
            .remove_shopping_list_item(list.id, owner, item.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceNotFound);
    }

    #[tokio::test]
    async fn delete_removes_list_and_items() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let owner = user_in(&db, "cleanup@example.com").await;
        let other = user_in(&db, "bystander@example.com").await;
        let list = db
            .create_shopping_list(owner, "Short lived".to_owned(), None)
            .await
            .unwrap();
        let item = db
            .add_shopping_list_item(
                list.id,
                owner,
                &NewShoppingListItem {
                    custom_item_name: Some("Bread".to_owned()),
                    ..NewShoppingListItem::default()
                },
            )
            .await
            .unwrap();

        let err = db.delete_shopping_list(list.id, other).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceNotFound);

        db.delete_shopping_list(list.id, owner).await.unwrap();
        assert!(db.get_shopping_list(list.id, owner).await.unwrap().is_none());

        // Items went with the list, so targeting one now misses
        let err = db
            .set_item_purchased(list.id, owner, item.id, true)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceNotFound);

        let lists = db.list_shopping_lists(owner).await.unwrap();
        assert!(lists.is_empty());
    }

    #[tokio::test]
    async fn lists_are_newest_first() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let owner = user_in(&db, "order@example.com").await;

        for name in ["First", "Second", "Third"] {
            db.create_shopping_list(owner, name.to_owned(), None)
                .await
                .unwrap();
            // Distinct created_at values keep the ordering deterministic
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let lists = db.list_shopping_lists(owner).await.unwrap();
        let names: Vec<&str> = lists.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Third", "Second", "First"]);
    }
}
