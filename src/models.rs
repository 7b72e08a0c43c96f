// ABOUTME: Core data models and types for the Savora nutrition API
// ABOUTME: Defines User, Profile, Recipe, shopping list and reference catalog records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

//! # Data Models
//!
//! This module contains the core data structures used throughout the Savora
//! server. Records are plain serde-serializable structs persisted through the
//! database layer; enums carry the closed vocabularies shared between the
//! HTTP surface, prompt assembly, and storage.
//!
//! ## Core Models
//!
//! - `User`: Account record with status gating login
//! - `Profile`: Public-facing user profile
//! - `Allergy` / `Deficiency` / `Ingredient`: Seeded reference catalogs
//! - `Recipe`: Generated recipe with nutrition facts and shopping list
//! - `ShoppingList` / `ShoppingListItem`: Standalone shopping lists

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

// ================================================================================================
// Closed Vocabularies
// ================================================================================================

/// User account status for the suspension workflow
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum UserStatus {
    /// Account created but not yet activated
    Pending,
    /// Account active (the state new registrations start in)
    #[default]
    Active,
    /// Account suspended by an operator
    Suspended,
}

impl UserStatus {
    /// Check if user can login
    #[must_use]
    pub const fn can_login(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Get user-friendly status message
    #[must_use]
    pub const fn to_message(&self) -> &'static str {
        match self {
            Self::Pending => "Your account is not yet activated",
            Self::Active => "Account is active",
            Self::Suspended => "Your account has been suspended",
        }
    }
}

impl Display for UserStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Suspended => write!(f, "suspended"),
        }
    }
}

impl FromStr for UserStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            _ => Err(AppError::invalid_input(format!("Invalid user status: {s}")).into()),
        }
    }
}

/// Severity of an allergy or deficiency link
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Mild reaction or deficiency
    #[default]
    Mild,
    /// Moderate reaction or deficiency
    Moderate,
    /// Severe reaction or deficiency
    Severe,
}

impl Severity {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mild" => Ok(Self::Mild),
            "moderate" => Ok(Self::Moderate),
            "severe" => Ok(Self::Severe),
            _ => Err(AppError::invalid_input(format!("Invalid severity: {s}")).into()),
        }
    }
}

/// Gender options accepted by recipe generation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male
    Male,
    /// Female
    Female,
    /// Other or unspecified
    Other,
}

impl Gender {
    /// Convert to the string embedded in prompts
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Gender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            _ => Err(AppError::invalid_input(format!("Invalid gender: {s}")).into()),
        }
    }
}

/// Physical activity level accepted by recipe generation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// Light exercise 1-3 days per week
    Light,
    /// Moderate exercise 3-5 days per week
    Moderate,
    /// Hard exercise 6-7 days per week
    Active,
    /// Very hard exercise and a physical job
    VeryActive,
}

impl ActivityLevel {
    /// Convert to the string embedded in prompts
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sedentary => "sedentary",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Active => "active",
            Self::VeryActive => "very-active",
        }
    }
}

impl Display for ActivityLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivityLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sedentary" => Ok(Self::Sedentary),
            "light" => Ok(Self::Light),
            "moderate" => Ok(Self::Moderate),
            "active" => Ok(Self::Active),
            "very-active" => Ok(Self::VeryActive),
            _ => Err(AppError::invalid_input(format!("Invalid activity level: {s}")).into()),
        }
    }
}

/// Recipe difficulty rating
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Difficulty {
    /// Suitable for beginners
    Easy,
    /// Some cooking experience helpful
    #[default]
    Medium,
    /// Advanced techniques or timing
    Hard,
}

impl Difficulty {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Self::Easy),
            "Medium" => Ok(Self::Medium),
            "Hard" => Ok(Self::Hard),
            _ => Err(AppError::invalid_input(format!("Invalid difficulty: {s}")).into()),
        }
    }
}

// ================================================================================================
// Account Models
// ================================================================================================

/// Represents a registered user account
///
/// Users authenticate with email and password; the password hash never
/// leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// User email address (unique, used for login)
    pub email: String,
    /// Display name shown in API responses
    pub display_name: Option<String>,
    /// Bcrypt hash of the user's password
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// When the user account was created
    pub created_at: DateTime<Utc>,
    /// Last time the user logged in or refreshed a token
    pub last_active: DateTime<Utc>,
    /// Whether the user account is active
    pub is_active: bool,
    /// Account status gating login
    pub user_status: UserStatus,
}

impl User {
    /// Create a new active user with the given email and password hash
    #[must_use]
    pub fn new(email: String, password_hash: String, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            display_name,
            password_hash,
            created_at: now,
            last_active: now,
            is_active: true,
            user_status: UserStatus::Active,
        }
    }

    /// Check whether the account may authenticate
    #[must_use]
    pub const fn can_login(&self) -> bool {
        self.is_active && self.user_status.can_login()
    }
}

/// Public-facing user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// User this profile belongs to
    pub user_id: Uuid,
    /// Unique handle (optional)
    pub username: Option<String>,
    /// Full name
    pub full_name: Option<String>,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    /// Short biography
    pub bio: Option<String>,
    /// When the profile was created
    pub created_at: DateTime<Utc>,
    /// When the profile was last updated
    pub updated_at: DateTime<Utc>,
}

// ================================================================================================
// Reference Catalogs
// ================================================================================================

/// Allergy reference catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allergy {
    /// Unique identifier
    pub id: Uuid,
    /// Allergy name (unique, e.g. "Nuts")
    pub name: String,
    /// Human-readable description
    pub description: Option<String>,
    /// Typical severity of reactions to this allergen
    pub severity_level: Option<Severity>,
}

/// Nutritional deficiency reference catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deficiency {
    /// Unique identifier
    pub id: Uuid,
    /// Deficiency name (unique, e.g. "Iron")
    pub name: String,
    /// Human-readable description
    pub description: Option<String>,
    /// Recommended daily amount
    pub recommended_daily_amount: Option<f64>,
    /// Unit for the recommended amount (mg, IU, ...)
    pub unit: Option<String>,
}

/// Ingredient reference catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    /// Unique identifier
    pub id: Uuid,
    /// Ingredient name (unique)
    pub name: String,
    /// Grouping category (protein, vegetable, grain, ...)
    pub category: Option<String>,
    /// Nutrition facts per 100g as JSON (calories, protein_g, carbs_g, fat_g, fiber_g)
    pub nutrition_per_100g: Option<serde_json::Value>,
    /// Allergy catalog names this ingredient commonly triggers
    pub common_allergens: Vec<String>,
}

/// A user's link to an allergy catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAllergy {
    /// Unique identifier of the link row
    pub id: Uuid,
    /// User this link belongs to
    pub user_id: Uuid,
    /// Linked allergy catalog entry
    pub allergy_id: Uuid,
    /// Catalog name, joined for display
    pub allergy_name: String,
    /// Severity of this user's reaction
    pub severity: Severity,
    /// Free-text notes
    pub notes: Option<String>,
    /// When the link was created
    pub created_at: DateTime<Utc>,
}

/// A user's link to a deficiency catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDeficiency {
    /// Unique identifier of the link row
    pub id: Uuid,
    /// User this link belongs to
    pub user_id: Uuid,
    /// Linked deficiency catalog entry
    pub deficiency_id: Uuid,
    /// Catalog name, joined for display
    pub deficiency_name: String,
    /// Severity of this user's deficiency
    pub severity: Severity,
    /// Free-text notes
    pub notes: Option<String>,
    /// When the deficiency was diagnosed
    pub diagnosed_date: Option<NaiveDate>,
    /// When the link was created
    pub created_at: DateTime<Utc>,
}

// ================================================================================================
// Recipe Models
// ================================================================================================

/// Nutrition facts attached to a recipe
///
/// Calories are numeric; the macro fields keep the display strings the
/// generator produces ("25g").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutritionInfo {
    /// Calories per serving
    pub calories: f64,
    /// Protein per serving (e.g. "25g")
    pub protein: String,
    /// Carbohydrates per serving (e.g. "45g")
    pub carbs: String,
    /// Fat per serving (e.g. "12g")
    pub fat: String,
    /// Fiber per serving (e.g. "8g")
    pub fiber: String,
}

/// A generated recipe persisted for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique identifier
    pub id: Uuid,
    /// User who generated the recipe
    pub user_id: Uuid,
    /// Recipe title
    pub title: String,
    /// Short description
    pub description: String,
    /// Ingredient lines with quantities
    pub ingredients: Vec<String>,
    /// Step-by-step instructions
    pub instructions: Vec<String>,
    /// Nutrition facts per serving
    pub nutrition_info: NutritionInfo,
    /// Shopping list entries for the recipe
    pub shopping_list: Vec<String>,
    /// Warnings about allergens that may still be present
    pub allergen_warnings: Vec<String>,
    /// How the recipe addresses the requested deficiencies
    pub nutritional_benefits: Vec<String>,
    /// Cooking time as display text (e.g. "30 minutes")
    pub cook_time: String,
    /// Number of servings
    pub servings: u32,
    /// Difficulty rating
    pub difficulty: Difficulty,
    /// Cuisine the recipe belongs to
    pub cuisine_type: Option<String>,
    /// Echo of the generation request (foodPreference, allergies, deficiencies, dietaryRestrictions)
    pub dietary_preferences: Option<serde_json::Value>,
    /// Whether other users may view this recipe
    pub is_public: bool,
    /// Free-form tags
    pub tags: Vec<String>,
    /// When the recipe was created
    pub created_at: DateTime<Utc>,
    /// When the recipe was last updated
    pub updated_at: DateTime<Utc>,
}

/// A user's bookmark of a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    /// Unique identifier
    pub id: Uuid,
    /// User who favorited the recipe
    pub user_id: Uuid,
    /// Favorited recipe
    pub recipe_id: Uuid,
    /// Free-text notes
    pub notes: Option<String>,
    /// When the favorite was created
    pub created_at: DateTime<Utc>,
}

// ================================================================================================
// Shopping List Models
// ================================================================================================

/// A user's shopping list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingList {
    /// Unique identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// List name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Whether the whole list is done
    pub is_completed: bool,
    /// When the list was created
    pub created_at: DateTime<Utc>,
    /// When the list was last updated
    pub updated_at: DateTime<Utc>,
}

/// A single item on a shopping list
///
/// Exactly one of `ingredient_id` and `custom_item_name` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingListItem {
    /// Unique identifier
    pub id: Uuid,
    /// List this item belongs to
    pub shopping_list_id: Uuid,
    /// Catalog ingredient reference
    pub ingredient_id: Option<Uuid>,
    /// Free-text item name for off-catalog items
    pub custom_item_name: Option<String>,
    /// Amount to buy
    pub quantity: Option<f64>,
    /// Unit for the quantity
    pub unit: Option<String>,
    /// Whether the item has been purchased
    pub is_purchased: bool,
    /// Free-text notes
    pub notes: Option<String>,
    /// When the item was added
    pub created_at: DateTime<Utc>,
}

/// A shopping list together with its items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingListWithItems {
    /// The list record
    #[serde(flatten)]
    pub list: ShoppingList,
    /// Items on the list
    pub items: Vec<ShoppingListItem>,
}
