// src/ingredients/handlers.rs

use axum::{
    extract::{Extension, Path, Query},
    response::Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::models::{Ingredient, IngredientQueryParams};
use crate::common::{ApiError, AppState};

/// GET /api/ingredients - List ingredients (with optional name prefix filter)
///
/// Backs the ingredient picker on the recipe form, so the list is returned
/// whole rather than paginated.
pub async fn list_ingredients(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(params): Query<IngredientQueryParams>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    let state = state_lock.read().await.clone();

    let ingredients = match params.name.as_deref().filter(|n| !n.is_empty()) {
        Some(prefix) => {
            // SQLite LIKE is case-insensitive for ASCII
            sqlx::query_as::<_, Ingredient>(
                "SELECT id, name, measurement_unit FROM ingredients WHERE name LIKE ? ORDER BY name",
            )
            .bind(format!("{}%", prefix))
            .fetch_all(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?
        }
        None => {
            sqlx::query_as::<_, Ingredient>(
                "SELECT id, name, measurement_unit FROM ingredients ORDER BY name",
            )
            .fetch_all(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?
        }
    };

    debug!(
        ingredient_count = ingredients.len(),
        filter = ?params.name,
        "Successfully loaded ingredients list"
    );

    Ok(Json(ingredients))
}

/// GET /api/ingredients/:id - Get a specific ingredient by ID
pub async fn get_ingredient(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(ingredient_id): Path<String>,
) -> Result<Json<Ingredient>, ApiError> {
    let state = state_lock.read().await.clone();

    let ingredient = sqlx::query_as::<_, Ingredient>(
        "SELECT id, name, measurement_unit FROM ingredients WHERE id = ?",
    )
    .bind(&ingredient_id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?
    .ok_or_else(|| ApiError::NotFound(format!("Ingredient not found: {}", ingredient_id)))?;

    Ok(Json(ingredient))
}
