// ABOUTME: HTTP middleware for request authentication and cross-origin access
// ABOUTME: Provides bearer token validation and CORS layer construction

pub mod auth;
pub mod cors;

// Authentication middleware
pub use auth::{AuthMiddleware, AuthenticatedUser};

// CORS configuration
pub use cors::setup_cors;
