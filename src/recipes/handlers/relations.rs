// src/recipes/handlers/relations.rs

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use tokio::sync::RwLock;
use tracing::info;

use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};
use crate::recipes::handlers::crud::fetch_recipe;
use crate::recipes::models::RecipeShortResponse;
use crate::relations::{add_relation, remove_relation, RelationKind};

/// POST /api/recipes/:id/favorite - Add a recipe to favorites
pub async fn favorite_recipe(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(recipe_id): Path<String>,
) -> Result<(StatusCode, Json<RecipeShortResponse>), ApiError> {
    add_recipe_relation(state_lock, authed, recipe_id, RelationKind::Favorite).await
}

/// DELETE /api/recipes/:id/favorite - Remove a recipe from favorites
pub async fn unfavorite_recipe(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(recipe_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    remove_recipe_relation(state_lock, authed, recipe_id, RelationKind::Favorite).await
}

/// POST /api/recipes/:id/shopping_cart - Add a recipe to the shopping cart
pub async fn add_to_shopping_cart(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(recipe_id): Path<String>,
) -> Result<(StatusCode, Json<RecipeShortResponse>), ApiError> {
    add_recipe_relation(state_lock, authed, recipe_id, RelationKind::ShoppingCart).await
}

/// DELETE /api/recipes/:id/shopping_cart - Remove a recipe from the cart
pub async fn remove_from_shopping_cart(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(recipe_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    remove_recipe_relation(state_lock, authed, recipe_id, RelationKind::ShoppingCart).await
}

// ============================================================================
// Helper Functions
// ============================================================================

async fn add_recipe_relation(
    state_lock: Arc<RwLock<AppState>>,
    authed: AuthedUser,
    recipe_id: String,
    kind: RelationKind,
) -> Result<(StatusCode, Json<RecipeShortResponse>), ApiError> {
    let state = state_lock.read().await.clone();

    // Missing recipe is a 404; a duplicate relation below is a 400
    let recipe = fetch_recipe(&state, &recipe_id).await?;
    add_relation(&state.db, kind, &authed.id, &recipe.id).await?;

    info!(
        kind = ?kind,
        user_id = %authed.id,
        recipe_id = %recipe.id,
        "Recipe relation added"
    );

    Ok((
        StatusCode::CREATED,
        Json(RecipeShortResponse::from_recipe(&recipe)),
    ))
}

async fn remove_recipe_relation(
    state_lock: Arc<RwLock<AppState>>,
    authed: AuthedUser,
    recipe_id: String,
    kind: RelationKind,
) -> Result<StatusCode, ApiError> {
    let state = state_lock.read().await.clone();

    fetch_recipe(&state, &recipe_id).await?;
    remove_relation(&state.db, kind, &authed.id, &recipe_id).await?;

    info!(
        kind = ?kind,
        user_id = %authed.id,
        recipe_id = %recipe_id,
        "Recipe relation removed"
    );

    Ok(StatusCode::NO_CONTENT)
}
