// ABOUTME: Recipe generation pipeline from validated request to stored recipe
// ABOUTME: Prompts the configured LLM, parses and guards the output, and persists it
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::models::{GenerateRecipeRequest, GeneratedRecipe, ValidatedRequest};
use super::prompt;
use crate::config::LlmConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::models::Recipe;

/// Drives recipe generation end to end
///
/// Validates the request, prompts the model, parses and guards the output,
/// and stores the result before handing it back.
pub struct RecipeGenerator {
    provider: Arc<dyn LlmProvider>,
    database: Arc<Database>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl RecipeGenerator {
    /// Create a generator bound to a provider and database
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        database: Arc<Database>,
        config: &LlmConfig,
    ) -> Self {
        Self {
            provider,
            database,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Generate a recipe for the user and persist it
    ///
    /// # Errors
    ///
    /// Returns validation errors for a bad request, the provider's error code
    /// with a generic message when the upstream call fails, and
    /// `InvalidFormat` when the model output cannot be parsed.
    pub async fn generate(
        &self,
        user_id: Uuid,
        request: &GenerateRecipeRequest,
    ) -> AppResult<Recipe> {
        let validated = request.validate()?;

        let chat_request = ChatRequest::new(vec![
            ChatMessage::system(prompt::build_system_prompt(&validated)),
            ChatMessage::user(prompt::USER_PROMPT),
        ])
        .with_model(&self.model)
        .with_max_tokens(self.max_tokens)
        .with_temperature(self.temperature);

        let response = self.provider.complete(&chat_request).await.map_err(|e| {
            warn!(
                provider = self.provider.name(),
                error = %e,
                "LLM completion failed during recipe generation"
            );
            AppError::new(e.code, "Failed to generate recipe")
                .with_details(json!({"reason": e.message}))
        })?;

        let mut generated = parse_generated_recipe(&response.content)?;
        flag_missed_allergens(&mut generated, &validated.allergies);

        let recipe = assemble_recipe(user_id, &validated, generated);
        self.database.create_recipe(&recipe).await?;

        info!(
            recipe_id = %recipe.id,
            user_id = %user_id,
            model = %response.model,
            "Generated recipe stored"
        );
        Ok(recipe)
    }
}

/// Strip optional Markdown code fences and parse the model output
fn parse_generated_recipe(content: &str) -> AppResult<GeneratedRecipe> {
    let body = strip_code_fences(content);
    serde_json::from_str(body).map_err(|e| {
        warn!("Model returned unparseable recipe JSON: {e}");
        AppError::new(ErrorCode::InvalidFormat, "Invalid JSON response from AI")
    })
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Append a warning for every declared allergen still present in the ingredients
fn flag_missed_allergens(recipe: &mut GeneratedRecipe, allergies: &[String]) {
    for allergen in allergies {
        let needle = allergen.to_lowercase();
        let found = recipe
            .ingredients
            .iter()
            .any(|ingredient| ingredient.to_lowercase().contains(&needle));
        if found {
            warn!(
                allergen = %allergen,
                "Generated ingredients mention a declared allergen"
            );
            recipe
                .allergen_warnings
                .push(format!("May contain {allergen}: found in the ingredient list"));
        }
    }
}

fn assemble_recipe(
    user_id: Uuid,
    validated: &ValidatedRequest,
    generated: GeneratedRecipe,
) -> Recipe {
    let now = Utc::now();
    Recipe {
        id: Uuid::new_v4(),
        user_id,
        title: generated.title,
        description: generated.description,
        ingredients: generated.ingredients,
        instructions: generated.instructions,
        nutrition_info: generated.nutrition_info,
        shopping_list: generated.shopping_list,
        allergen_warnings: generated.allergen_warnings,
        nutritional_benefits: generated.nutritional_benefits,
        cook_time: generated.cook_time,
        servings: generated.servings,
        difficulty: generated.difficulty,
        cuisine_type: Some(validated.cuisine.clone()),
        dietary_preferences: Some(validated.preference_echo()),
        is_public: false,
        tags: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}
