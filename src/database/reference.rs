// ABOUTME: Reference catalog database operations and seed data
// ABOUTME: Read-only allergy, deficiency, and ingredient catalogs

use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::{parse_string_array, parse_uuid, Database};
use crate::errors::AppResult;
use crate::models::{Allergy, Deficiency, Ingredient};

/// Allergy catalog: name, description, typical reaction severity
const ALLERGY_SEEDS: &[(&str, &str, &str)] = &[
    (
        "Nuts",
        "Tree nuts and peanuts, including trace amounts in processed foods",
        "severe",
    ),
    (
        "Dairy",
        "Milk and milk-derived products such as cheese, butter, and whey",
        "moderate",
    ),
    (
        "Gluten",
        "Wheat, barley, rye, and other gluten-containing grains",
        "moderate",
    ),
    ("Eggs", "Chicken eggs and egg-derived binders", "moderate"),
    (
        "Shellfish",
        "Crustaceans such as shrimp, crab, and lobster",
        "severe",
    ),
    (
        "Soy",
        "Soybeans and soy derivatives such as tofu and soy sauce",
        "mild",
    ),
    ("Fish", "Finned fish such as salmon, tuna, and cod", "severe"),
];

/// Deficiency catalog: name, description, recommended daily amount, unit
const DEFICIENCY_SEEDS: &[(&str, &str, f64, &str)] = &[
    (
        "Iron",
        "Low iron stores affecting oxygen transport and energy levels",
        18.0,
        "mg",
    ),
    (
        "Vitamin D",
        "Insufficient vitamin D for bone and immune health",
        20.0,
        "mcg",
    ),
    (
        "Vitamin B12",
        "Low B12 affecting nerve function and red blood cell formation",
        2.4,
        "mcg",
    ),
    (
        "Calcium",
        "Insufficient calcium for bone density and muscle function",
        1000.0,
        "mg",
    ),
    (
        "Magnesium",
        "Low magnesium affecting muscle recovery and sleep",
        400.0,
        "mg",
    ),
    (
        "Zinc",
        "Insufficient zinc for immune function and wound healing",
        11.0,
        "mg",
    ),
    (
        "Vitamin C",
        "Low vitamin C affecting immunity and iron absorption",
        90.0,
        "mg",
    ),
];

struct IngredientSeed {
    name: &'static str,
    category: &'static str,
    /// calories, protein_g, carbs_g, fat_g, fiber_g per 100g
    nutrition: [f64; 5],
    allergens: &'static [&'static str],
}

const INGREDIENT_SEEDS: &[IngredientSeed] = &[
    IngredientSeed {
        name: "Chicken Breast",
        category: "Protein",
        nutrition: [165.0, 31.0, 0.0, 3.6, 0.0],
        allergens: &[],
    },
    IngredientSeed {
        name: "Salmon",
        category: "Protein",
        nutrition: [208.0, 20.0, 0.0, 13.0, 0.0],
        allergens: &["Fish"],
    },
    IngredientSeed {
        name: "Eggs",
        category: "Protein",
        nutrition: [155.0, 13.0, 1.1, 11.0, 0.0],
        allergens: &["Eggs"],
    },
    IngredientSeed {
        name: "Tofu",
        category: "Protein",
        nutrition: [76.0, 8.0, 1.9, 4.8, 0.3],
        allergens: &["Soy"],
    },
    IngredientSeed {
        name: "Shrimp",
        category: "Seafood",
        nutrition: [99.0, 24.0, 0.2, 0.3, 0.0],
        allergens: &["Shellfish"],
    },
    IngredientSeed {
        name: "Milk",
        category: "Dairy",
        nutrition: [61.0, 3.2, 4.8, 3.3, 0.0],
        allergens: &["Dairy"],
    },
    IngredientSeed {
        name: "Greek Yogurt",
        category: "Dairy",
        nutrition: [59.0, 10.0, 3.6, 0.4, 0.0],
        allergens: &["Dairy"],
    },
    IngredientSeed {
        name: "Almonds",
        category: "Nuts & Seeds",
        nutrition: [579.0, 21.0, 22.0, 50.0, 12.5],
        allergens: &["Nuts"],
    },
    IngredientSeed {
        name: "Wheat Flour",
        category: "Grains",
        nutrition: [364.0, 10.0, 76.0, 1.0, 2.7],
        allergens: &["Gluten"],
    },
    IngredientSeed {
        name: "Brown Rice",
        category: "Grains",
        nutrition: [112.0, 2.6, 24.0, 0.9, 1.8],
        allergens: &[],
    },
    IngredientSeed {
        name: "Lentils",
        category: "Legumes",
        nutrition: [116.0, 9.0, 20.0, 0.4, 7.9],
        allergens: &[],
    },
    IngredientSeed {
        name: "Spinach",
        category: "Vegetables",
        nutrition: [23.0, 2.9, 3.6, 0.4, 2.2],
        allergens: &[],
    },
];

impl Database {
    /// Create the reference catalog tables
    pub(super) async fn migrate_reference(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS allergies (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                description TEXT,
                severity_level TEXT CHECK (severity_level IN ('mild', 'moderate', 'severe'))
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS deficiencies (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                description TEXT,
                recommended_daily_amount REAL,
                unit TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ingredients (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                category TEXT,
                nutrition_per_100g TEXT,
                common_allergens TEXT NOT NULL DEFAULT '[]'
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Seed the reference catalogs, skipping entries that already exist
    ///
    /// # Errors
    ///
    /// Returns an error if an insert fails
    pub async fn seed_reference_data(&self) -> AppResult<()> {
        for &(name, description, severity) in ALLERGY_SEEDS {
            sqlx::query(
                r"
                INSERT INTO allergies (id, name, description, severity_level)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(name) DO NOTHING
                ",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(name)
            .bind(description)
            .bind(severity)
            .execute(&self.pool)
            .await?;
        }

        for &(name, description, amount, unit) in DEFICIENCY_SEEDS {
            sqlx::query(
                r"
                INSERT INTO deficiencies (id, name, description, recommended_daily_amount, unit)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(name) DO NOTHING
                ",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(name)
            .bind(description)
            .bind(amount)
            .bind(unit)
            .execute(&self.pool)
            .await?;
        }

        for seed in INGREDIENT_SEEDS {
            let [calories, protein_g, carbs_g, fat_g, fiber_g] = seed.nutrition;
            let nutrition = serde_json::json!({
                "calories": calories,
                "protein_g": protein_g,
                "carbs_g": carbs_g,
                "fat_g": fat_g,
                "fiber_g": fiber_g,
            });

            sqlx::query(
                r"
                INSERT INTO ingredients (id, name, category, nutrition_per_100g, common_allergens)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(name) DO NOTHING
                ",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(seed.name)
            .bind(seed.category)
            .bind(nutrition.to_string())
            .bind(serde_json::json!(seed.allergens).to_string())
            .execute(&self.pool)
            .await?;
        }

        debug!("Reference catalogs seeded");
        Ok(())
    }

    /// List all allergies ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_allergies(&self) -> AppResult<Vec<Allergy>> {
        let rows =
            sqlx::query("SELECT id, name, description, severity_level FROM allergies ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(Self::row_to_allergy).collect()
    }

    /// Get one allergy catalog entry
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_allergy(&self, allergy_id: Uuid) -> AppResult<Option<Allergy>> {
        let row =
            sqlx::query("SELECT id, name, description, severity_level FROM allergies WHERE id = ?1")
                .bind(allergy_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map_or(Ok(None), |row| Self::row_to_allergy(&row).map(Some))
    }

    fn row_to_allergy(row: &sqlx::sqlite::SqliteRow) -> AppResult<Allergy> {
        let id: String = row.try_get("id")?;
        let severity_level: Option<String> = row.try_get("severity_level")?;

        Ok(Allergy {
            id: parse_uuid(&id, "allergies.id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            severity_level: severity_level.and_then(|s| s.parse().ok()),
        })
    }

    /// List all deficiencies ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_deficiencies(&self) -> AppResult<Vec<Deficiency>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, description, recommended_daily_amount, unit
            FROM deficiencies ORDER BY name
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_deficiency).collect()
    }

    /// Get one deficiency catalog entry
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_deficiency(&self, deficiency_id: Uuid) -> AppResult<Option<Deficiency>> {
        let row = sqlx::query(
            r"
            SELECT id, name, description, recommended_daily_amount, unit
            FROM deficiencies WHERE id = ?1
            ",
        )
        .bind(deficiency_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map_or(Ok(None), |row| Self::row_to_deficiency(&row).map(Some))
    }

    fn row_to_deficiency(row: &sqlx::sqlite::SqliteRow) -> AppResult<Deficiency> {
        let id: String = row.try_get("id")?;

        Ok(Deficiency {
            id: parse_uuid(&id, "deficiencies.id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            recommended_daily_amount: row.try_get("recommended_daily_amount")?,
            unit: row.try_get("unit")?,
        })
    }

    /// List all ingredients ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_ingredients(&self) -> AppResult<Vec<Ingredient>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, category, nutrition_per_100g, common_allergens
            FROM ingredients ORDER BY name
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_ingredient).collect()
    }

    /// Get one ingredient catalog entry
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_ingredient(&self, ingredient_id: Uuid) -> AppResult<Option<Ingredient>> {
        let row = sqlx::query(
            r"
            SELECT id, name, category, nutrition_per_100g, common_allergens
            FROM ingredients WHERE id = ?1
            ",
        )
        .bind(ingredient_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map_or(Ok(None), |row| Self::row_to_ingredient(&row).map(Some))
    }

    fn row_to_ingredient(row: &sqlx::sqlite::SqliteRow) -> AppResult<Ingredient> {
        let id: String = row.try_get("id")?;
        let nutrition: Option<String> = row.try_get("nutrition_per_100g")?;
        let common_allergens: String = row.try_get("common_allergens")?;

        Ok(Ingredient {
            id: parse_uuid(&id, "ingredients.id")?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            nutrition_per_100g: nutrition.and_then(|s| serde_json::from_str(&s).ok()),
            common_allergens: parse_string_array(&common_allergens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    #[tokio::test]
    async fn catalogs_are_seeded_and_ordered() {
        let db = Database::new("sqlite::memory:").await.unwrap();

        let allergies = db.list_allergies().await.unwrap();
        assert_eq!(allergies.len(), 7);
        let names: Vec<&str> = allergies.iter().map(|a| a.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);

        let deficiencies = db.list_deficiencies().await.unwrap();
        assert_eq!(deficiencies.len(), 7);
        assert!(deficiencies.iter().any(|d| d.name == "Vitamin B12"));

        let ingredients = db.list_ingredients().await.unwrap();
        assert!(ingredients.len() >= 12);
    }

    #[tokio::test]
    async fn seeding_twice_does_not_duplicate() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.seed_reference_data().await.unwrap();

        assert_eq!(db.list_allergies().await.unwrap().len(), 7);
        assert_eq!(db.list_deficiencies().await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn single_entry_lookup_round_trips() {
        let db = Database::new("sqlite::memory:").await.unwrap();

        let allergies = db.list_allergies().await.unwrap();
        let nuts = allergies.iter().find(|a| a.name == "Nuts").unwrap();
        let loaded = db.get_allergy(nuts.id).await.unwrap().unwrap();
        assert_eq!(loaded.severity_level, Some(Severity::Severe));

        assert!(db.get_allergy(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ingredient_rows_carry_nutrition_and_allergens() {
        let db = Database::new("sqlite::memory:").await.unwrap();

        let ingredients = db.list_ingredients().await.unwrap();
        let salmon = ingredients.iter().find(|i| i.name == "Salmon").unwrap();
        assert_eq!(salmon.common_allergens, vec!["Fish".to_owned()]);

        let nutrition = salmon.nutrition_per_100g.as_ref().unwrap();
        assert!(nutrition.get("calories").is_some());
    }
}
