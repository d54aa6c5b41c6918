// src/recipes/handlers/shopping_list.rs

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tokio::sync::RwLock;
use tracing::info;

use crate::auth::{AuthedUser, User};
use crate::common::{ApiError, AppState};

#[derive(Debug, FromRow)]
pub(crate) struct AggregatedIngredient {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

#[derive(Debug, FromRow)]
pub(crate) struct CartRecipe {
    pub name: String,
    pub first_name: String,
    pub last_name: String,
}

/// GET /api/recipes/download_shopping_cart - Aggregated ingredients as a
/// text attachment
pub async fn download_shopping_cart(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();

    let cart_size: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM shopping_cart WHERE user_id = ?")
            .bind(&authed.id)
            .fetch_one(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;
    if cart_size == 0 {
        return Err(ApiError::BadRequest("shopping cart is empty".to_string()));
    }

    let items = aggregate_cart_ingredients(&state, &authed.id).await?;
    let recipes = carted_recipes(&state, &authed.id).await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&authed.id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let body = render_shopping_list(&user, &items, &recipes, Utc::now());

    info!(
        user_id = %authed.id,
        item_count = items.len(),
        recipe_count = recipes.len(),
        "Shopping list downloaded"
    );

    Ok((
        StatusCode::OK,
        [
            ("Content-Type", "text/plain; charset=utf-8".to_string()),
            (
                "Content-Disposition",
                format!(
                    "attachment; filename=\"{}_shopping_list.txt\"",
                    authed.username
                ),
            ),
        ],
        body,
    ))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Sums amounts per (name, measurement_unit) across every carted recipe, so
/// the same ingredient from two recipes appears once with a combined total.
pub(crate) async fn aggregate_cart_ingredients(
    state: &AppState,
    user_id: &str,
) -> Result<Vec<AggregatedIngredient>, ApiError> {
    sqlx::query_as::<_, AggregatedIngredient>(
        r#"
        SELECT i.name, i.measurement_unit, SUM(ri.amount) AS total
        FROM shopping_cart sc
        JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = ?
        GROUP BY i.name, i.measurement_unit
        ORDER BY i.name COLLATE NOCASE
        "#,
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)
}

pub(crate) async fn carted_recipes(
    state: &AppState,
    user_id: &str,
) -> Result<Vec<CartRecipe>, ApiError> {
    sqlx::query_as::<_, CartRecipe>(
        r#"
        SELECT r.name, u.first_name, u.last_name
        FROM shopping_cart sc
        JOIN recipes r ON r.id = sc.recipe_id
        JOIN users u ON u.id = r.author_id
        WHERE sc.user_id = ?
        ORDER BY r.name COLLATE NOCASE
        "#,
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)
}

pub(crate) fn render_shopping_list(
    user: &User,
    items: &[AggregatedIngredient],
    recipes: &[CartRecipe],
    now: DateTime<Utc>,
) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Shopping list for {} {}",
        user.first_name, user.last_name
    ));
    lines.push(format!("Date: {}", now.format("%d-%m-%Y")));
    lines.push(String::new());

    lines.push("Ingredients:".to_string());
    for (index, item) in items.iter().enumerate() {
        lines.push(format!(
            "{}. {} ({}) - {}",
            index + 1,
            capitalize(&item.name),
            item.measurement_unit,
            item.total
        ));
    }
    lines.push(String::new());

    lines.push("Recipes:".to_string());
    for recipe in recipes {
        lines.push(format!(
            "- {} (@ {} {})",
            recipe.name, recipe.first_name, recipe.last_name
        ));
    }
    lines.push(String::new());

    lines.push(format!("Recipebook ({})", now.format("%Y")));
    lines.join("\n")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
