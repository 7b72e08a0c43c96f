// ABOUTME: Route module organization for the Savora HTTP surface
// ABOUTME: Groups endpoints by domain with thin handlers delegating to service and database layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

//! Route module for the Savora server
//!
//! Each domain module contains route definitions and thin handler
//! functions; everything stateful lives behind [`crate::server::ServerResources`].

/// Registration, login, and token refresh routes
pub mod auth;
/// Health check and readiness routes
pub mod health;
/// Profile and dietary-link routes
pub mod profiles;
/// Recipe generation and library routes
pub mod recipes;
/// Reference catalog routes
pub mod reference;
/// Security event reporting routes
pub mod security;
/// Shopping list routes
pub mod shopping_lists;

pub use auth::{
    AuthRoutes, AuthService, LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest,
    RegisterResponse, UserInfo,
};
pub use health::HealthRoutes;
pub use profiles::ProfileRoutes;
pub use recipes::RecipeRoutes;
pub use reference::ReferenceRoutes;
pub use security::SecurityRoutes;
pub use shopping_lists::ShoppingListRoutes;
