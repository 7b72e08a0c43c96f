// ABOUTME: Recipe generation module wiring prompts, the LLM provider, and persistence
// ABOUTME: Exposes the request/response types and the RecipeGenerator entry point
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

//! # Recipe Generation
//!
//! Turns a user's dietary requirements into a stored recipe. The pipeline
//! validates and sanitizes the request, builds the nutritionist prompt,
//! asks the configured LLM provider for a completion, parses the JSON
//! output, flags any declared allergens the model ignored, and persists
//! the result for the requesting user.

mod generator;
mod models;
mod prompt;

pub use generator::RecipeGenerator;
pub use models::{GenerateRecipeRequest, GeneratedRecipe, RecipeResponse};
