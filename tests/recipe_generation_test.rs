// ABOUTME: Integration tests for the recipe generation endpoint and recipe library
// ABOUTME: Drives the full HTTP pipeline with a canned LLM provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use common::{
    body_json, canned_recipe_json, generation_request_body, register_and_login, send_json,
    test_app, test_resources_with_llm, CannedLlm,
};
use savora_server::server::HttpServer;

#[tokio::test]
async fn generation_returns_the_stored_recipe_in_wire_format() {
    let (app, _resources) = test_app().await;
    let token = register_and_login(&app, "cook@example.com").await;

    let response = send_json(
        &app,
        "POST",
        "/api/recipes/generate",
        Some(&token),
        Some(&generation_request_body()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert!(!body["id"].as_str().unwrap().is_empty());
    assert_eq!(body["title"], "Iron-Rich Lentil Bowl");
    assert_eq!(body["cookTime"], "35 minutes");
    assert_eq!(body["servings"], 2);
    assert_eq!(body["nutritionInfo"]["protein"], "24g");
    assert_eq!(body["shoppingList"].as_array().unwrap().len(), 3);
    assert!(body["allergenWarnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn generated_recipes_land_in_the_user_library() {
    let (app, _resources) = test_app().await;
    let token = register_and_login(&app, "cook@example.com").await;

    let response = send_json(
        &app,
        "POST",
        "/api/recipes/generate",
        Some(&token),
        Some(&generation_request_body()),
    )
    .await;
    let recipe_id = body_json(response).await["id"].as_str().unwrap().to_owned();

    let response = send_json(&app, "GET", "/api/recipes", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], recipe_id.as_str());

    let path = format!("/api/recipes/{recipe_id}");
    let response = send_json(&app, "GET", &path, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["title"], "Iron-Rich Lentil Bowl");
    assert_eq!(fetched["cuisine_type"], "Mediterranean");
}

#[tokio::test]
async fn recipes_are_isolated_per_user() {
    let (app, _resources) = test_app().await;
    let owner = register_and_login(&app, "owner@example.com").await;
    let other = register_and_login(&app, "other@example.com").await;

    let response = send_json(
        &app,
        "POST",
        "/api/recipes/generate",
        Some(&owner),
        Some(&generation_request_body()),
    )
    .await;
    let recipe_id = body_json(response).await["id"].as_str().unwrap().to_owned();

    let path = format!("/api/recipes/{recipe_id}");
    let response = send_json(&app, "GET", &path, Some(&other), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send_json(&app, "GET", "/api/recipes", Some(&other), None).await;
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn generation_requires_a_session() {
    let (app, _resources) = test_app().await;

    let response = send_json(
        &app,
        "POST",
        "/api/recipes/generate",
        None,
        Some(&generation_request_body()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_fields_fail_before_the_provider_is_called() {
    let (app, _resources) = test_app().await;
    let token = register_and_login(&app, "cook@example.com").await;

    let mut request = generation_request_body();
    request["age"] = json!("");

    let response = send_json(
        &app,
        "POST",
        "/api/recipes/generate",
        Some(&token),
        Some(&request),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "MISSING_REQUIRED_FIELD");
}

#[tokio::test]
async fn provider_outage_surfaces_as_bad_gateway() {
    let resources = test_resources_with_llm(CannedLlm::failing()).await;
    let app = HttpServer::new(Arc::clone(&resources)).router();
    let token = register_and_login(&app, "cook@example.com").await;

    let response = send_json(
        &app,
        "POST",
        "/api/recipes/generate",
        Some(&token),
        Some(&generation_request_body()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "EXTERNAL_SERVICE_ERROR");
    assert_eq!(body["error"]["message"], "Failed to generate recipe");
}

#[tokio::test]
async fn unparseable_model_output_is_a_format_error() {
    let resources =
        test_resources_with_llm(CannedLlm::completing("Sorry, I cannot help with that.")).await;
    let app = HttpServer::new(Arc::clone(&resources)).router();
    let token = register_and_login(&app, "cook@example.com").await;

    let response = send_json(
        &app,
        "POST",
        "/api/recipes/generate",
        Some(&token),
        Some(&generation_request_body()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_FORMAT");

    // Nothing was stored
    let response = send_json(&app, "GET", "/api/recipes", Some(&token), None).await;
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn fenced_model_output_is_accepted_end_to_end() {
    let fenced = format!("```json\n{}\n```", canned_recipe_json());
    let resources = test_resources_with_llm(CannedLlm::completing(fenced)).await;
    let app = HttpServer::new(Arc::clone(&resources)).router();
    let token = register_and_login(&app, "cook@example.com").await;

    let response = send_json(
        &app,
        "POST",
        "/api/recipes/generate",
        Some(&token),
        Some(&generation_request_body()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn generation_has_a_per_user_budget() {
    let (app, _resources) = test_app().await;
    let token = register_and_login(&app, "cook@example.com").await;

    // Test config allows 5 generations per window
    for _ in 0..5 {
        let response = send_json(
            &app,
            "POST",
            "/api/recipes/generate",
            Some(&token),
            Some(&generation_request_body()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send_json(
        &app,
        "POST",
        "/api/recipes/generate",
        Some(&token),
        Some(&generation_request_body()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");

    // Another user's budget is untouched
    let other = register_and_login(&app, "other@example.com").await;
    let response = send_json(
        &app,
        "POST",
        "/api/recipes/generate",
        Some(&other),
        Some(&generation_request_body()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn favorites_round_trip_through_the_api() {
    let (app, _resources) = test_app().await;
    let token = register_and_login(&app, "cook@example.com").await;

    let response = send_json(
        &app,
        "POST",
        "/api/recipes/generate",
        Some(&token),
        Some(&generation_request_body()),
    )
    .await;
    let recipe_id = body_json(response).await["id"].as_str().unwrap().to_owned();

    let path = format!("/api/recipes/{recipe_id}/favorite");
    let response = send_json(
        &app,
        "POST",
        &path,
        Some(&token),
        Some(&json!({ "notes": "weeknight staple" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let favorite = body_json(response).await;
    assert_eq!(favorite["recipe_id"], recipe_id.as_str());
    assert_eq!(favorite["notes"], "weeknight staple");

    let response = send_json(&app, "GET", "/api/recipes/favorites", Some(&token), None).await;
    let favorites = body_json(response).await;
    assert_eq!(favorites.as_array().unwrap().len(), 1);
    assert_eq!(favorites[0]["id"], recipe_id.as_str());

    let response = send_json(&app, "DELETE", &path, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send_json(&app, "GET", "/api/recipes/favorites", Some(&token), None).await;
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_recipe_removes_it_from_the_library() {
    let (app, _resources) = test_app().await;
    let token = register_and_login(&app, "cook@example.com").await;

    let response = send_json(
        &app,
        "POST",
        "/api/recipes/generate",
        Some(&token),
        Some(&generation_request_body()),
    )
    .await;
    let recipe_id = body_json(response).await["id"].as_str().unwrap().to_owned();

    let path = format!("/api/recipes/{recipe_id}");
    let response = send_json(&app, "DELETE", &path, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send_json(&app, "GET", &path, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
