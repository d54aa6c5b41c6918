//! Ingredient routes

use axum::{routing::get, Router};

use super::handlers;

/// Creates and returns the ingredients router
///
/// # Routes
/// - `GET /api/ingredients` - List ingredients, `?name=` prefix filter
/// - `GET /api/ingredients/:id` - Get ingredient by id
pub fn ingredients_routes() -> Router {
    Router::new()
        .route("/api/ingredients", get(handlers::list_ingredients))
        .route("/api/ingredients/:id", get(handlers::get_ingredient))
}
