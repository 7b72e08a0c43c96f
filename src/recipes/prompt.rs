// ABOUTME: Prompt assembly for the recipe generation pipeline
// ABOUTME: Builds the nutritionist system prompt and the fixed user instruction

use super::models::ValidatedRequest;

/// Fixed user turn sent with every generation request
///
/// The JSON shape here is the contract [`GeneratedRecipe`](super::GeneratedRecipe)
/// is parsed against.
pub const USER_PROMPT: &str = r#"Generate a healthy recipe that addresses my nutritional needs. Make sure to:
- Avoid all my allergens completely
- Include ingredients rich in nutrients I'm deficient in
- Match my dietary preferences
- Be suitable for my activity level and demographics

Return the response as a valid JSON object with this structure:
{
  "title": "Recipe Name",
  "description": "Brief description",
  "cookTime": "X minutes",
  "servings": 2,
  "difficulty": "Easy|Medium|Hard",
  "ingredients": ["ingredient 1", "ingredient 2"],
  "instructions": ["step 1", "step 2"],
  "nutritionInfo": {
    "calories": 400,
    "protein": "25g",
    "carbs": "45g",
    "fat": "12g",
    "fiber": "8g"
  },
  "shoppingList": ["item 1", "item 2"],
  "allergenWarnings": ["warning if any"],
  "nutritionalBenefits": ["benefit 1", "benefit 2"]
}"#;

/// Build the system prompt carrying the user's requirements
pub fn build_system_prompt(request: &ValidatedRequest) -> String {
    format!(
        "You are a professional nutritionist and chef. Generate a healthy recipe based on the \
         user's preferences and requirements. You must return a valid JSON response with the \
         exact structure specified.\n\
         \n\
         User Requirements:\n\
         - Food Preference: {food_preference}\n\
         - Allergies to avoid: {allergies}\n\
         - Nutritional deficiencies to address: {deficiencies}\n\
         - Age: {age}\n\
         - Gender: {gender}\n\
         - Activity Level: {activity_level}\n\
         - Preferred Cuisine: {cuisine}\n\
         - Dietary Restrictions: {restrictions}\n\
         \n\
         CRITICAL: Ensure the recipe:\n\
         1. NEVER includes any ingredients the user is allergic to\n\
         2. Focuses on nutrients that help with their deficiencies\n\
         3. Matches their dietary preferences and restrictions\n\
         4. Is appropriate for their age, gender, and activity level\n\
         5. Follows the specified cuisine style\n\
         \n\
         Return ONLY a valid JSON object with this exact structure:",
        food_preference = request.food_preference,
        allergies = join_or_none(&request.allergies),
        deficiencies = join_or_none(&request.deficiencies),
        age = request.age,
        gender = request.gender.as_str(),
        activity_level = request.activity_level.as_str(),
        cuisine = request.cuisine,
        restrictions = text_or_none(&request.dietary_restrictions),
    )
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "None".to_owned()
    } else {
        values.join(", ")
    }
}

fn text_or_none(value: &str) -> &str {
    if value.is_empty() { "None" } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityLevel, Gender};

    fn request() -> ValidatedRequest {
        ValidatedRequest {
            food_preference: "high protein".to_owned(),
            allergies: vec!["Peanuts".to_owned(), "Shellfish".to_owned()],
            deficiencies: vec!["Iron".to_owned()],
            age: 34,
            gender: Gender::Male,
            activity_level: ActivityLevel::VeryActive,
            cuisine: "Japanese".to_owned(),
            dietary_restrictions: String::new(),
        }
    }

    #[test]
    fn system_prompt_carries_every_requirement() {
        let prompt = build_system_prompt(&request());

        assert!(prompt.contains("- Food Preference: high protein"));
        assert!(prompt.contains("- Allergies to avoid: Peanuts, Shellfish"));
        assert!(prompt.contains("- Nutritional deficiencies to address: Iron"));
        assert!(prompt.contains("- Age: 34"));
        assert!(prompt.contains("- Gender: male"));
        assert!(prompt.contains("- Activity Level: very-active"));
        assert!(prompt.contains("- Preferred Cuisine: Japanese"));
        assert!(prompt.contains("1. NEVER includes any ingredients the user is allergic to"));
        assert!(prompt.ends_with("Return ONLY a valid JSON object with this exact structure:"));
    }

    #[test]
    fn empty_lists_render_as_none() {
        let mut sparse = request();
        sparse.allergies.clear();
        sparse.deficiencies.clear();

        let prompt = build_system_prompt(&sparse);
        assert!(prompt.contains("- Allergies to avoid: None"));
        assert!(prompt.contains("- Nutritional deficiencies to address: None"));
        assert!(prompt.contains("- Dietary Restrictions: None"));
    }

    #[test]
    fn user_prompt_pins_the_output_contract() {
        assert!(USER_PROMPT.contains("\"cookTime\": \"X minutes\""));
        assert!(USER_PROMPT.contains("\"nutritionInfo\""));
        assert!(USER_PROMPT.contains("\"allergenWarnings\""));
        assert!(USER_PROMPT.contains("Avoid all my allergens completely"));
    }
}
