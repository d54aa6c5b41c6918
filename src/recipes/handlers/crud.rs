// src/recipes/handlers/crud.rs

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::auth::{AuthedUser, OptionalUser, User};
use crate::common::images::{decode_base64_image, delete_image, save_image};
use crate::common::{
    generate_raw_id, generate_recipe_id, generate_recipe_ingredient_id, ApiError, AppState,
    Validator,
};
use crate::recipes::models::*;
use crate::recipes::validators::RecipeValidator;
use crate::relations::{is_related, RelationKind};
use crate::users::handlers::accounts::subscribed_author_ids;
use crate::users::UserResponse;

/// POST /api/recipes - Create a recipe
pub async fn create_recipe(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<RecipeWriteRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    let state = state_lock.read().await.clone();

    let mut validation = RecipeValidator.validate(&payload);
    if payload.image.as_deref().map(str::trim).unwrap_or("").is_empty() {
        validation.add_error("image", "Image is required");
    }
    if !validation.is_valid {
        warn!(user_id = %authed.id, "Recipe creation rejected by validation");
        return Err(validation.into());
    }

    check_ingredients_exist(&state, &payload.ingredients).await?;

    // Decode and store the image before any rows exist so a bad payload
    // leaves nothing behind
    let decoded = decode_base64_image(payload.image.as_deref().unwrap_or_default())?;
    let recipe_id = generate_recipe_id();
    let filename = format!(
        "recipe_{}_{}.{}",
        recipe_id,
        generate_raw_id(8),
        decoded.extension
    );
    save_image(&state.recipe_images_dir, &filename, &decoded.data).await?;

    let mut tx = state.db.begin().await.map_err(ApiError::DatabaseError)?;

    sqlx::query(
        r#"
        INSERT INTO recipes (id, author_id, name, image, text, cooking_time, pub_date)
        VALUES (?, ?, ?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(&recipe_id)
    .bind(&authed.id)
    .bind(&payload.name)
    .bind(&filename)
    .bind(&payload.text)
    .bind(payload.cooking_time)
    .execute(&mut *tx)
    .await
    .map_err(ApiError::DatabaseError)?;

    for ingredient in &payload.ingredients {
        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients (id, recipe_id, ingredient_id, amount)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(generate_recipe_ingredient_id())
        .bind(&recipe_id)
        .bind(&ingredient.id)
        .bind(ingredient.amount)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;
    }

    tx.commit().await.map_err(ApiError::DatabaseError)?;

    info!(
        recipe_id = %recipe_id,
        author_id = %authed.id,
        ingredient_count = payload.ingredients.len(),
        "Recipe created"
    );

    let recipe = fetch_recipe(&state, &recipe_id).await?;
    let response = recipe_response(&state, &recipe, Some(&authed)).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/recipes - List recipes (paginated, newest first, filterable)
pub async fn list_recipes(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    OptionalUser(viewer): OptionalUser,
    Query(params): Query<RecipeQueryParams>,
) -> Result<Json<RecipeListResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    // Parse pagination parameters with defaults
    let page = params.page.unwrap_or(1).max(1); // Ensure page is at least 1
    let limit = params.limit.unwrap_or(6).clamp(1, 30);
    let offset = (page - 1) * limit;

    // Build the filter clause; relation filters only apply for
    // authenticated requesters
    let mut conditions: Vec<&str> = Vec::new();
    let mut binds: Vec<String> = Vec::new();
    if let Some(author) = params.author.as_deref().filter(|a| !a.is_empty()) {
        conditions.push("author_id = ?");
        binds.push(author.to_string());
    }
    if let Some(viewer) = &viewer {
        if params.is_favorited.as_deref() == Some("1") {
            conditions.push("id IN (SELECT recipe_id FROM favorites WHERE user_id = ?)");
            binds.push(viewer.id.clone());
        }
        if params.is_in_shopping_cart.as_deref() == Some("1") {
            conditions.push("id IN (SELECT recipe_id FROM shopping_cart WHERE user_id = ?)");
            binds.push(viewer.id.clone());
        }
    }
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM recipes{}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total = count_query
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let list_sql = format!(
        "SELECT * FROM recipes{} ORDER BY pub_date DESC, id LIMIT ? OFFSET ?",
        where_clause
    );
    let mut list_query = sqlx::query_as::<_, Recipe>(&list_sql);
    for bind in &binds {
        list_query = list_query.bind(bind);
    }
    let recipes = list_query
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    // Stamp viewer flags from three set lookups instead of a query per row
    let favorited = related_recipe_ids(&state, viewer.as_ref(), RelationKind::Favorite).await?;
    let in_cart = related_recipe_ids(&state, viewer.as_ref(), RelationKind::ShoppingCart).await?;
    let subscribed = subscribed_author_ids(&state, viewer.as_ref()).await?;

    let mut recipe_responses = Vec::with_capacity(recipes.len());
    for recipe in &recipes {
        recipe_responses.push(
            build_recipe_response(
                &state,
                recipe,
                favorited.contains(&recipe.id),
                in_cart.contains(&recipe.id),
                subscribed.contains(&recipe.author_id),
            )
            .await?,
        );
    }

    debug!(
        recipe_count = recipe_responses.len(),
        total = total,
        page = page,
        limit = limit,
        "Successfully loaded paginated recipe list"
    );

    Ok(Json(RecipeListResponse {
        recipes: recipe_responses,
        total: total as usize,
        page,
        page_size: limit,
    }))
}

/// GET /api/recipes/:id - Retrieve a single recipe
pub async fn get_recipe(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    OptionalUser(viewer): OptionalUser,
    Path(recipe_id): Path<String>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let recipe = fetch_recipe(&state, &recipe_id).await?;
    let response = recipe_response(&state, &recipe, viewer.as_ref()).await?;
    Ok(Json(response))
}

/// PATCH /api/recipes/:id - Update a recipe (author only)
pub async fn update_recipe(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(recipe_id): Path<String>,
    Json(payload): Json<RecipeWriteRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let recipe = fetch_recipe(&state, &recipe_id).await?;
    if recipe.author_id != authed.id {
        warn!(
            recipe_id = %recipe_id,
            user_id = %authed.id,
            "Update rejected: not the author"
        );
        return Err(ApiError::Forbidden(
            "Only the author can edit this recipe".to_string(),
        ));
    }

    let validation = RecipeValidator.validate(&payload);
    if !validation.is_valid {
        return Err(validation.into());
    }
    check_ingredients_exist(&state, &payload.ingredients).await?;

    // A new image is optional on update; the stored file is kept otherwise
    let mut new_image: Option<String> = None;
    if let Some(image) = payload.image.as_deref().filter(|i| !i.trim().is_empty()) {
        let decoded = decode_base64_image(image)?;
        let filename = format!(
            "recipe_{}_{}.{}",
            recipe_id,
            generate_raw_id(8),
            decoded.extension
        );
        save_image(&state.recipe_images_dir, &filename, &decoded.data).await?;
        new_image = Some(filename);
    }

    let mut tx = state.db.begin().await.map_err(ApiError::DatabaseError)?;

    if let Some(filename) = &new_image {
        sqlx::query("UPDATE recipes SET name = ?, text = ?, cooking_time = ?, image = ? WHERE id = ?")
            .bind(&payload.name)
            .bind(&payload.text)
            .bind(payload.cooking_time)
            .bind(filename)
            .bind(&recipe_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::DatabaseError)?;
    } else {
        sqlx::query("UPDATE recipes SET name = ?, text = ?, cooking_time = ? WHERE id = ?")
            .bind(&payload.name)
            .bind(&payload.text)
            .bind(payload.cooking_time)
            .bind(&recipe_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::DatabaseError)?;
    }

    // The ingredient set is replaced wholesale
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
        .bind(&recipe_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;
    for ingredient in &payload.ingredients {
        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients (id, recipe_id, ingredient_id, amount)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(generate_recipe_ingredient_id())
        .bind(&recipe_id)
        .bind(&ingredient.id)
        .bind(ingredient.amount)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;
    }

    tx.commit().await.map_err(ApiError::DatabaseError)?;

    if new_image.is_some() {
        if let Some(old) = &recipe.image {
            delete_image(&state.recipe_images_dir, old).await;
        }
    }

    info!(recipe_id = %recipe_id, author_id = %authed.id, "Recipe updated");

    let updated = fetch_recipe(&state, &recipe_id).await?;
    let response = recipe_response(&state, &updated, Some(&authed)).await?;
    Ok(Json(response))
}

/// DELETE /api/recipes/:id - Delete a recipe (author only)
pub async fn delete_recipe(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(recipe_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let state = state_lock.read().await.clone();

    let recipe = fetch_recipe(&state, &recipe_id).await?;
    if recipe.author_id != authed.id {
        warn!(
            recipe_id = %recipe_id,
            user_id = %authed.id,
            "Delete rejected: not the author"
        );
        return Err(ApiError::Forbidden(
            "Only the author can delete this recipe".to_string(),
        ));
    }

    // Junction, favorite and cart rows go with the recipe via ON DELETE CASCADE
    sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(&recipe_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    if let Some(image) = &recipe.image {
        delete_image(&state.recipe_images_dir, image).await;
    }

    info!(recipe_id = %recipe_id, author_id = %authed.id, "Recipe deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Helper Functions
// ============================================================================

pub(crate) async fn fetch_recipe(state: &AppState, recipe_id: &str) -> Result<Recipe, ApiError> {
    sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound(format!("Recipe not found: {}", recipe_id)))
}

/// Full read projection with per-viewer flags resolved by existence checks.
pub(crate) async fn recipe_response(
    state: &AppState,
    recipe: &Recipe,
    viewer: Option<&AuthedUser>,
) -> Result<RecipeResponse, ApiError> {
    let (is_favorited, is_in_shopping_cart, author_subscribed) = match viewer {
        Some(v) => (
            is_related(&state.db, RelationKind::Favorite, &v.id, &recipe.id)
                .await
                .map_err(ApiError::DatabaseError)?,
            is_related(&state.db, RelationKind::ShoppingCart, &v.id, &recipe.id)
                .await
                .map_err(ApiError::DatabaseError)?,
            is_related(&state.db, RelationKind::Subscription, &v.id, &recipe.author_id)
                .await
                .map_err(ApiError::DatabaseError)?,
        ),
        None => (false, false, false),
    };

    build_recipe_response(state, recipe, is_favorited, is_in_shopping_cart, author_subscribed)
        .await
}

async fn build_recipe_response(
    state: &AppState,
    recipe: &Recipe,
    is_favorited: bool,
    is_in_shopping_cart: bool,
    author_subscribed: bool,
) -> Result<RecipeResponse, ApiError> {
    let author = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&recipe.author_id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let rows: Vec<(String, String, String, i64)> = sqlx::query_as(
        r#"
        SELECT i.id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ?
        ORDER BY i.name
        "#,
    )
    .bind(&recipe.id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let ingredients = rows
        .into_iter()
        .map(
            |(id, name, measurement_unit, amount)| IngredientAmountResponse {
                id,
                name,
                measurement_unit,
                amount,
            },
        )
        .collect();

    Ok(RecipeResponse {
        id: recipe.id.clone(),
        author: UserResponse::from_user(&author, author_subscribed),
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name.clone(),
        image: recipe_image_url(recipe.image.as_deref()),
        text: recipe.text.clone(),
        cooking_time: recipe.cooking_time,
        pub_date: recipe.pub_date.clone(),
    })
}

/// Rejects payloads that reference ingredient ids not present in the catalog.
async fn check_ingredients_exist(
    state: &AppState,
    ingredients: &[IngredientAmountRequest],
) -> Result<(), ApiError> {
    let placeholders = ingredients
        .iter()
        .map(|_| "?")
        .collect::<Vec<_>>()
        .join(",");
    let sql = format!("SELECT id FROM ingredients WHERE id IN ({})", placeholders);

    let mut query = sqlx::query_scalar::<_, String>(&sql);
    for ingredient in ingredients {
        query = query.bind(&ingredient.id);
    }
    let known: HashSet<String> = query
        .fetch_all(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .into_iter()
        .collect();

    for ingredient in ingredients {
        if !known.contains(&ingredient.id) {
            return Err(ApiError::BadRequest(format!(
                "Unknown ingredient id: {}",
                ingredient.id
            )));
        }
    }
    Ok(())
}

/// Recipe ids the viewer has favorited or carted, for flag stamping in lists.
async fn related_recipe_ids(
    state: &AppState,
    viewer: Option<&AuthedUser>,
    kind: RelationKind,
) -> Result<HashSet<String>, ApiError> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    let ids: Vec<String> = sqlx::query_scalar(&format!(
        "SELECT {} FROM {} WHERE {} = ?",
        kind.target_column(),
        kind.table(),
        kind.user_column(),
    ))
    .bind(&viewer.id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;
    Ok(ids.into_iter().collect())
}
