// ABOUTME: Request and response types for recipe generation
// ABOUTME: Accepts the legacy camelCase wire format and validates it into prompt-ready form

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::constants::limits;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{ActivityLevel, Difficulty, Gender, NutritionInfo, Recipe};
use crate::validation::{sanitize_text, validate_text_area};

/// Recipe generation request
///
/// Accepts both snake_case and the original camelCase field names, with
/// missing fields defaulting to empty so validation can report them with
/// field-level messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRecipeRequest {
    /// Main preference, e.g. "high protein" or "comfort food"
    #[serde(default, alias = "foodPreference")]
    pub food_preference: String,
    /// Allergen names to exclude
    #[serde(default)]
    pub allergies: Vec<String>,
    /// Nutritional deficiencies the recipe should address
    #[serde(default)]
    pub deficiencies: Vec<String>,
    /// Age in years, as entered in the form
    #[serde(default)]
    pub age: String,
    /// Gender, one of male/female/other
    #[serde(default)]
    pub gender: String,
    /// Activity level, e.g. "moderate" or "very-active"
    #[serde(default, alias = "activityLevel")]
    pub activity_level: String,
    /// Preferred cuisine style
    #[serde(default)]
    pub cuisine: String,
    /// Free-text dietary restrictions
    #[serde(default, alias = "dietaryRestrictions")]
    pub dietary_restrictions: String,
}

impl GenerateRecipeRequest {
    /// Validate and sanitize the request into its prompt-ready form
    ///
    /// # Errors
    ///
    /// Returns field-level errors for missing required fields, a
    /// non-numeric or out-of-range age, and unknown gender or activity
    /// level values.
    pub fn validate(&self) -> AppResult<ValidatedRequest> {
        let food_preference = validate_text_area(
            &self.food_preference,
            limits::MAX_INPUT_LENGTH,
            "Food preference",
        )?;

        let age_text = self.age.trim();
        if age_text.is_empty() {
            return Err(AppError::missing_field("Age"));
        }
        let age: u32 = age_text
            .parse()
            .map_err(|_| AppError::invalid_input("Age must be a number"))?;
        if !(limits::MIN_AGE..=limits::MAX_AGE).contains(&age) {
            return Err(AppError::new(
                ErrorCode::ValueOutOfRange,
                format!(
                    "Age must be between {} and {}",
                    limits::MIN_AGE,
                    limits::MAX_AGE
                ),
            ));
        }

        let gender_text = self.gender.trim();
        if gender_text.is_empty() {
            return Err(AppError::missing_field("Gender"));
        }
        let gender: Gender = gender_text.to_lowercase().parse()?;

        let activity_text = self.activity_level.trim();
        if activity_text.is_empty() {
            return Err(AppError::missing_field("Activity level"));
        }
        let activity_level: ActivityLevel = activity_text.to_lowercase().parse()?;

        let cuisine = validate_text_area(&self.cuisine, limits::MAX_INPUT_LENGTH, "Cuisine")?;

        Ok(ValidatedRequest {
            food_preference,
            allergies: sanitize_list(&self.allergies),
            deficiencies: sanitize_list(&self.deficiencies),
            age,
            gender,
            activity_level,
            cuisine,
            dietary_restrictions: sanitize_text(&self.dietary_restrictions),
        })
    }
}

/// A sanitized generation request ready for prompt assembly
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    /// Sanitized food preference text
    pub food_preference: String,
    /// Sanitized allergen names, empties dropped
    pub allergies: Vec<String>,
    /// Sanitized deficiency names, empties dropped
    pub deficiencies: Vec<String>,
    /// Age in years, within the accepted range
    pub age: u32,
    /// Parsed gender
    pub gender: Gender,
    /// Parsed activity level
    pub activity_level: ActivityLevel,
    /// Sanitized cuisine text
    pub cuisine: String,
    /// Sanitized restrictions; empty when the user reported none
    pub dietary_restrictions: String,
}

impl ValidatedRequest {
    /// The request echo stored alongside the recipe
    #[must_use]
    pub fn preference_echo(&self) -> serde_json::Value {
        json!({
            "foodPreference": self.food_preference,
            "allergies": self.allergies,
            "deficiencies": self.deficiencies,
            "dietaryRestrictions": self.dietary_restrictions,
        })
    }
}

/// The model's JSON output, in the shape the prompt demands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipe {
    /// Recipe title
    pub title: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Cooking time as display text
    pub cook_time: String,
    /// Number of servings
    pub servings: u32,
    /// Difficulty rating
    pub difficulty: Difficulty,
    /// Ingredient lines with quantities
    pub ingredients: Vec<String>,
    /// Step-by-step instructions
    pub instructions: Vec<String>,
    /// Nutrition facts per serving
    pub nutrition_info: NutritionInfo,
    /// Shopping list entries
    #[serde(default)]
    pub shopping_list: Vec<String>,
    /// Allergen warnings the model raised
    #[serde(default)]
    pub allergen_warnings: Vec<String>,
    /// How the recipe addresses the requested deficiencies
    #[serde(default)]
    pub nutritional_benefits: Vec<String>,
}

/// Wire format returned by the generation endpoint
///
/// Field names match the original client contract, so the stored recipe
/// is echoed back in camelCase with its database id attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    /// Stored recipe id
    pub id: Uuid,
    /// Recipe title
    pub title: String,
    /// Short description
    pub description: String,
    /// Cooking time as display text
    pub cook_time: String,
    /// Number of servings
    pub servings: u32,
    /// Difficulty rating
    pub difficulty: Difficulty,
    /// Ingredient lines with quantities
    pub ingredients: Vec<String>,
    /// Step-by-step instructions
    pub instructions: Vec<String>,
    /// Nutrition facts per serving
    pub nutrition_info: NutritionInfo,
    /// Shopping list entries
    pub shopping_list: Vec<String>,
    /// Allergen warnings, including guard-appended ones
    pub allergen_warnings: Vec<String>,
    /// How the recipe addresses the requested deficiencies
    pub nutritional_benefits: Vec<String>,
}

impl From<Recipe> for RecipeResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            description: recipe.description,
            cook_time: recipe.cook_time,
            servings: recipe.servings,
            difficulty: recipe.difficulty,
            ingredients: recipe.ingredients,
            instructions: recipe.instructions,
            nutrition_info: recipe.nutrition_info,
            shopping_list: recipe.shopping_list,
            allergen_warnings: recipe.allergen_warnings,
            nutritional_benefits: recipe.nutritional_benefits,
        }
    }
}

fn sanitize_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| sanitize_text(value))
        .filter(|value| !value.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> GenerateRecipeRequest {
        GenerateRecipeRequest {
            food_preference: "high protein".to_owned(),
            allergies: vec!["Nuts".to_owned()],
            deficiencies: vec!["Iron".to_owned()],
            age: "29".to_owned(),
            gender: "female".to_owned(),
            activity_level: "moderate".to_owned(),
            cuisine: "Mediterranean".to_owned(),
            dietary_restrictions: "no pork".to_owned(),
        }
    }

    #[test]
    fn accepts_camel_case_field_names() {
        let request: GenerateRecipeRequest = serde_json::from_str(
            r#"{
                "foodPreference": "vegetarian",
                "allergies": ["Dairy"],
                "age": "41",
                "gender": "other",
                "activityLevel": "light",
                "cuisine": "Thai",
                "dietaryRestrictions": "low sodium"
            }"#,
        )
        .unwrap();

        assert_eq!(request.food_preference, "vegetarian");
        assert_eq!(request.activity_level, "light");
        assert_eq!(request.dietary_restrictions, "low sodium");
        assert!(request.deficiencies.is_empty());
    }

    #[test]
    fn validation_produces_parsed_fields() {
        let validated = valid_request().validate().unwrap();
        assert_eq!(validated.age, 29);
        assert_eq!(validated.gender, Gender::Female);
        assert_eq!(validated.activity_level, ActivityLevel::Moderate);
        assert_eq!(validated.allergies, vec!["Nuts".to_owned()]);
    }

    #[test]
    fn validation_rejects_missing_required_fields() {
        let mut request = valid_request();
        request.food_preference = "   ".to_owned();
        let err = request.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);

        let mut request = valid_request();
        request.gender = String::new();
        let err = request.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);

        let mut request = valid_request();
        request.cuisine = String::new();
        let err = request.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
    }

    #[test]
    fn validation_checks_age_bounds() {
        let mut request = valid_request();
        request.age = "abc".to_owned();
        assert_eq!(
            request.validate().unwrap_err().code,
            ErrorCode::InvalidInput
        );

        request.age = "0".to_owned();
        assert_eq!(
            request.validate().unwrap_err().code,
            ErrorCode::ValueOutOfRange
        );

        request.age = "121".to_owned();
        assert_eq!(
            request.validate().unwrap_err().code,
            ErrorCode::ValueOutOfRange
        );
    }

    #[test]
    fn validation_rejects_unknown_enum_values() {
        let mut request = valid_request();
        request.gender = "robot".to_owned();
        assert_eq!(
            request.validate().unwrap_err().code,
            ErrorCode::InvalidInput
        );

        let mut request = valid_request();
        request.activity_level = "heroic".to_owned();
        assert_eq!(
            request.validate().unwrap_err().code,
            ErrorCode::InvalidInput
        );
    }

    #[test]
    fn validation_sanitizes_free_text() {
        let mut request = valid_request();
        request.food_preference = "spicy <script>alert(1)</script>food".to_owned();
        request.allergies = vec!["<b>Nuts</b>".to_owned(), "   ".to_owned()];

        let validated = request.validate().unwrap();
        assert_eq!(validated.food_preference, "spicy food");
        assert_eq!(validated.allergies, vec!["Nuts".to_owned()]);
    }

    #[test]
    fn preference_echo_uses_the_original_field_names() {
        let echo = valid_request().validate().unwrap().preference_echo();
        assert_eq!(echo["foodPreference"], "high protein");
        assert_eq!(echo["allergies"][0], "Nuts");
        assert_eq!(echo["dietaryRestrictions"], "no pork");
    }

    #[test]
    fn generated_recipe_defaults_optional_lists() {
        let generated: GeneratedRecipe = serde_json::from_str(
            r#"{
                "title": "Bowl",
                "description": "A bowl",
                "cookTime": "20 minutes",
                "servings": 2,
                "difficulty": "Easy",
                "ingredients": ["rice"],
                "instructions": ["cook"],
                "nutritionInfo": {
                    "calories": 300,
                    "protein": "10g",
                    "carbs": "50g",
                    "fat": "5g",
                    "fiber": "4g"
                }
            }"#,
        )
        .unwrap();

        assert!(generated.shopping_list.is_empty());
        assert!(generated.allergen_warnings.is_empty());
        assert!(generated.nutritional_benefits.is_empty());
        assert!((generated.nutrition_info.calories - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn response_serializes_in_camel_case() {
        let generated: GeneratedRecipe = serde_json::from_str(
            r#"{
                "title": "Bowl",
                "cookTime": "20 minutes",
                "servings": 2,
                "difficulty": "Hard",
                "ingredients": ["rice"],
                "instructions": ["cook"],
                "nutritionInfo": {
                    "calories": 300,
                    "protein": "10g",
                    "carbs": "50g",
                    "fat": "5g",
                    "fiber": "4g"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(generated.cook_time, "20 minutes");

        let response = RecipeResponse {
            id: Uuid::new_v4(),
            title: generated.title,
            description: generated.description,
            cook_time: generated.cook_time,
            servings: generated.servings,
            difficulty: generated.difficulty,
            ingredients: generated.ingredients,
            instructions: generated.instructions,
            nutrition_info: generated.nutrition_info,
            shopping_list: generated.shopping_list,
            allergen_warnings: generated.allergen_warnings,
            nutritional_benefits: generated.nutritional_benefits,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("cookTime").is_some());
        assert!(json.get("nutritionInfo").is_some());
        assert!(json.get("allergenWarnings").is_some());
        assert_eq!(json["difficulty"], "Hard");
    }
}
