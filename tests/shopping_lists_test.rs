// ABOUTME: Integration tests for shopping list and item management over HTTP
// ABOUTME: Covers list CRUD, item payload rules, purchase toggling, and ownership checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{body_json, register_and_login, send_json, test_app};

#[tokio::test]
async fn lists_round_trip_through_the_api() {
    let (app, _resources) = test_app().await;
    let token = register_and_login(&app, "cook@example.com").await;

    let response = send_json(
        &app,
        "POST",
        "/api/shopping-lists",
        Some(&token),
        Some(&json!({ "name": "Weekly shop", "description": "Sunday run" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let list = body_json(response).await;
    assert_eq!(list["name"], "Weekly shop");
    assert_eq!(list["description"], "Sunday run");
    assert_eq!(list["is_completed"], false);
    let list_id = list["id"].as_str().unwrap().to_owned();

    let response = send_json(&app, "GET", "/api/shopping-lists", Some(&token), None).await;
    let lists = body_json(response).await;
    assert_eq!(lists.as_array().unwrap().len(), 1);

    // The detail view flattens the list record next to its items
    let path = format!("/api/shopping-lists/{list_id}");
    let response = send_json(&app, "GET", &path, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    assert_eq!(detail["name"], "Weekly shop");
    assert!(detail["items"].as_array().unwrap().is_empty());

    let response = send_json(&app, "DELETE", &path, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send_json(&app, "GET", &path, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_names_are_validated() {
    let (app, _resources) = test_app().await;
    let token = register_and_login(&app, "cook@example.com").await;

    let response = send_json(
        &app,
        "POST",
        "/api/shopping-lists",
        Some(&token),
        Some(&json!({ "name": "" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "MISSING_REQUIRED_FIELD");
}

#[tokio::test]
async fn custom_items_can_be_added_updated_and_removed() {
    let (app, _resources) = test_app().await;
    let token = register_and_login(&app, "cook@example.com").await;

    let response = send_json(
        &app,
        "POST",
        "/api/shopping-lists",
        Some(&token),
        Some(&json!({ "name": "Pantry" })),
    )
    .await;
    let list_id = body_json(response).await["id"].as_str().unwrap().to_owned();

    let items_path = format!("/api/shopping-lists/{list_id}/items");
    let response = send_json(
        &app,
        "POST",
        &items_path,
        Some(&token),
        Some(&json!({
            "custom_item_name": "oat milk",
            "quantity": 2.0,
            "unit": "cartons"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let item = body_json(response).await;
    assert_eq!(item["custom_item_name"], "oat milk");
    assert_eq!(item["is_purchased"], false);
    let item_id = item["id"].as_str().unwrap().to_owned();

    // Tick it off and adjust the quantity in one patch
    let item_path = format!("/api/shopping-lists/{list_id}/items/{item_id}");
    let response = send_json(
        &app,
        "PATCH",
        &item_path,
        Some(&token),
        Some(&json!({ "is_purchased": true, "quantity": 1.0 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["is_purchased"], true);
    assert!((updated["quantity"].as_f64().unwrap() - 1.0).abs() < f64::EPSILON);
    // Untouched fields keep their stored values
    assert_eq!(updated["unit"], "cartons");

    let response = send_json(&app, "DELETE", &item_path, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let path = format!("/api/shopping-lists/{list_id}");
    let response = send_json(&app, "GET", &path, Some(&token), None).await;
    assert!(body_json(response).await["items"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn catalog_items_resolve_against_the_ingredient_seed() {
    let (app, resources) = test_app().await;
    let token = register_and_login(&app, "cook@example.com").await;

    let response = send_json(
        &app,
        "POST",
        "/api/shopping-lists",
        Some(&token),
        Some(&json!({ "name": "Produce" })),
    )
    .await;
    let list_id = body_json(response).await["id"].as_str().unwrap().to_owned();

    let ingredients = resources.database.list_ingredients().await.unwrap();
    let ingredient_id = ingredients[0].id;

    let items_path = format!("/api/shopping-lists/{list_id}/items");
    let response = send_json(
        &app,
        "POST",
        &items_path,
        Some(&token),
        Some(&json!({ "ingredient_id": ingredient_id, "quantity": 3.0 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let item = body_json(response).await;
    assert_eq!(item["ingredient_id"], ingredient_id.to_string());
    assert!(item["custom_item_name"].is_null());
}

#[tokio::test]
async fn item_payload_requires_exactly_one_name_source() {
    let (app, resources) = test_app().await;
    let token = register_and_login(&app, "cook@example.com").await;

    let response = send_json(
        &app,
        "POST",
        "/api/shopping-lists",
        Some(&token),
        Some(&json!({ "name": "Mixed" })),
    )
    .await;
    let list_id = body_json(response).await["id"].as_str().unwrap().to_owned();
    let items_path = format!("/api/shopping-lists/{list_id}/items");

    // Neither set
    let response = send_json(
        &app,
        "POST",
        &items_path,
        Some(&token),
        Some(&json!({ "quantity": 1.0 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Both set
    let ingredients = resources.database.list_ingredients().await.unwrap();
    let response = send_json(
        &app,
        "POST",
        &items_path,
        Some(&token),
        Some(&json!({
            "ingredient_id": ingredients[0].id,
            "custom_item_name": "oat milk"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn lists_are_scoped_to_their_owner() {
    let (app, _resources) = test_app().await;
    let owner = register_and_login(&app, "owner@example.com").await;
    let other = register_and_login(&app, "other@example.com").await;

    let response = send_json(
        &app,
        "POST",
        "/api/shopping-lists",
        Some(&owner),
        Some(&json!({ "name": "Private" })),
    )
    .await;
    let list_id = body_json(response).await["id"].as_str().unwrap().to_owned();
    let path = format!("/api/shopping-lists/{list_id}");

    let response = send_json(&app, "GET", &path, Some(&other), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let items_path = format!("/api/shopping-lists/{list_id}/items");
    let response = send_json(
        &app,
        "POST",
        &items_path,
        Some(&other),
        Some(&json!({ "custom_item_name": "oat milk" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send_json(&app, "GET", "/api/shopping-lists", Some(&other), None).await;
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn item_notes_are_sanitized_on_the_way_in() {
    let (app, _resources) = test_app().await;
    let token = register_and_login(&app, "cook@example.com").await;

    let response = send_json(
        &app,
        "POST",
        "/api/shopping-lists",
        Some(&token),
        Some(&json!({ "name": "Notes" })),
    )
    .await;
    let list_id = body_json(response).await["id"].as_str().unwrap().to_owned();

    let items_path = format!("/api/shopping-lists/{list_id}/items");
    let response = send_json(
        &app,
        "POST",
        &items_path,
        Some(&token),
        Some(&json!({
            "custom_item_name": "oat milk",
            "notes": "the <b>unsweetened</b> one"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let item = body_json(response).await;
    assert_eq!(item["notes"], "the unsweetened one");
}
