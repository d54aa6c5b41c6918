// src/recipes/handlers/links.rs

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::{Json, Redirect},
};
use tokio::sync::RwLock;
use tracing::debug;

use crate::common::{ApiError, AppState};
use crate::recipes::handlers::crud::fetch_recipe;
use crate::recipes::models::ShortLinkResponse;

/// GET /api/recipes/:id/get-link - Short link for sharing a recipe
pub async fn get_short_link(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(recipe_id): Path<String>,
) -> Result<Json<ShortLinkResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    fetch_recipe(&state, &recipe_id).await?;
    let short_link = format!("{}/s/{}", state.base_url, recipe_id);

    debug!(recipe_id = %recipe_id, short_link = %short_link, "Short link issued");

    Ok(Json(ShortLinkResponse { short_link }))
}

/// GET /s/:id - Redirect a short link to the recipe page
pub async fn resolve_short_link(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(recipe_id): Path<String>,
) -> Result<Redirect, ApiError> {
    let state = state_lock.read().await.clone();

    fetch_recipe(&state, &recipe_id).await?;
    Ok(Redirect::to(&format!("/recipes/{}", recipe_id)))
}
