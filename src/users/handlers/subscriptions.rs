// src/users/handlers/subscriptions.rs

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::auth::{AuthedUser, User};
use crate::common::{ApiError, AppState};
use crate::recipes::models::{recipe_image_url, RecipeShortResponse};
use crate::relations::{add_relation, remove_relation, RelationKind};
use crate::users::models::*;

/// POST /api/users/:id/subscribe - Subscribe to an author
pub async fn subscribe(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(author_id): Path<String>,
    Query(params): Query<SubscriptionQueryParams>,
) -> Result<(StatusCode, Json<SubscribedAuthorResponse>), ApiError> {
    let state = state_lock.read().await.clone();

    let author = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&author_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound(format!("User not found: {}", author_id)))?;

    add_relation(&state.db, RelationKind::Subscription, &authed.id, &author.id).await?;

    info!(
        subscriber_id = %authed.id,
        author_id = %author.id,
        "Subscription created"
    );

    let response = subscribed_author_response(&state, &author, params.recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// DELETE /api/users/:id/subscribe - Unsubscribe from an author
pub async fn unsubscribe(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(author_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let state = state_lock.read().await.clone();

    // Missing author is a 404; missing subscription below is a 400
    let author_exists: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
        .bind(&author_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;
    if author_exists.is_none() {
        return Err(ApiError::NotFound(format!("User not found: {}", author_id)));
    }

    remove_relation(&state.db, RelationKind::Subscription, &authed.id, &author_id).await?;

    info!(
        subscriber_id = %authed.id,
        author_id = %author_id,
        "Subscription removed"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users/subscriptions - Authors the current user follows
pub async fn list_subscriptions(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(params): Query<SubscriptionQueryParams>,
) -> Result<Json<SubscriptionListResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    // Parse pagination parameters with defaults
    let page = params.page.unwrap_or(1).max(1); // Ensure page is at least 1
    let limit = params.limit.unwrap_or(6).clamp(1, 100);
    let offset = (page - 1) * limit;

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ?")
            .bind(&authed.id)
            .fetch_one(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

    let authors = sqlx::query_as::<_, User>(
        r#"
        SELECT u.*
        FROM users u
        JOIN subscriptions s ON s.author_id = u.id
        WHERE s.subscriber_id = ?
        ORDER BY u.username
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(&authed.id)
    .bind(limit as i64)
    .bind(offset as i64)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let mut author_responses = Vec::with_capacity(authors.len());
    for author in &authors {
        author_responses
            .push(subscribed_author_response(&state, author, params.recipes_limit).await?);
    }

    debug!(
        subscriber_id = %authed.id,
        author_count = author_responses.len(),
        total = total,
        page = page,
        limit = limit,
        "Successfully loaded subscription list"
    );

    Ok(Json(SubscriptionListResponse {
        authors: author_responses,
        total: total as usize,
        page,
        page_size: limit,
    }))
}

/// Builds the author projection embedded in subscription responses: profile
/// fields plus a newest-first recipe preview capped by `recipes_limit`.
pub(crate) async fn subscribed_author_response(
    state: &AppState,
    author: &User,
    recipes_limit: Option<u32>,
) -> Result<SubscribedAuthorResponse, ApiError> {
    let recipes_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE author_id = ?")
        .bind(&author.id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let rows: Vec<(String, String, Option<String>, i64)> = match recipes_limit {
        Some(cap) => sqlx::query_as(
            r#"
            SELECT id, name, image, cooking_time
            FROM recipes
            WHERE author_id = ?
            ORDER BY pub_date DESC
            LIMIT ?
            "#,
        )
        .bind(&author.id)
        .bind(cap as i64)
        .fetch_all(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?,
        None => sqlx::query_as(
            r#"
            SELECT id, name, image, cooking_time
            FROM recipes
            WHERE author_id = ?
            ORDER BY pub_date DESC
            "#,
        )
        .bind(&author.id)
        .fetch_all(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?,
    };

    let recipes = rows
        .into_iter()
        .map(|(id, name, image, cooking_time)| RecipeShortResponse {
            id,
            name,
            image: recipe_image_url(image.as_deref()),
            cooking_time,
        })
        .collect();

    Ok(SubscribedAuthorResponse {
        id: author.id.clone(),
        username: author.username.clone(),
        first_name: author.first_name.clone(),
        last_name: author.last_name.clone(),
        email: author.email.clone(),
        is_subscribed: true,
        avatar: avatar_url(author.avatar.as_deref()),
        recipes,
        recipes_count,
    })
}
