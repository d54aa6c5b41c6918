// src/recipes/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{crud, images, links, relations, shopping_list};

/// Create the recipes router with CRUD, relation toggles, shopping list,
/// short links and image routes
pub fn recipes_routes() -> Router {
    Router::new()
        // Collection routes; the static download segment wins over :id
        .route(
            "/api/recipes",
            get(crud::list_recipes).post(crud::create_recipe),
        )
        .route(
            "/api/recipes/download_shopping_cart",
            get(shopping_list::download_shopping_cart),
        )
        .route(
            "/api/recipes/:id",
            get(crud::get_recipe)
                .patch(crud::update_recipe)
                .delete(crud::delete_recipe),
        )
        // Relation toggles
        .route(
            "/api/recipes/:id/favorite",
            post(relations::favorite_recipe).delete(relations::unfavorite_recipe),
        )
        .route(
            "/api/recipes/:id/shopping_cart",
            post(relations::add_to_shopping_cart).delete(relations::remove_from_shopping_cart),
        )
        // Sharing
        .route("/api/recipes/:id/get-link", get(links::get_short_link))
        .route("/s/:id", get(links::resolve_short_link))
        // Images
        .route("/api/recipes/:id/image", post(images::upload_recipe_image))
        .route(
            "/api/media/recipes/:filename",
            get(images::serve_recipe_image),
        )
}
