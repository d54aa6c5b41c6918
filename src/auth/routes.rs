//! Authentication routes

use axum::{routing::post, Router};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/auth/token/login` - Exchange credentials for a JWT
/// - `POST /api/auth/token/logout` - Logout (client-side token removal)
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/token/login", post(handlers::login_handler))
        .route("/api/auth/token/logout", post(handlers::logout_handler))
}
