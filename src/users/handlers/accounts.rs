// src/users/handlers/accounts.rs

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::auth::handlers::hash_password;
use crate::auth::{AuthedUser, OptionalUser, User};
use crate::common::{
    generate_user_id, is_unique_violation, safe_email_log, ApiError, AppState, Validator,
};
use crate::relations::{is_related, RelationKind};
use crate::users::models::*;
use crate::users::validators::RegisterValidator;

/// POST /api/users - Register a new account
pub async fn register_user(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let state = state_lock.read().await.clone();

    let validation = RegisterValidator.validate(&payload);
    if !validation.is_valid {
        warn!(
            email = %safe_email_log(&payload.email),
            "Registration rejected by validation"
        );
        return Err(validation.into());
    }

    // Check for an existing email
    let email_taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(&payload.email)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;
    if email_taken > 0 {
        warn!(
            email = %safe_email_log(&payload.email),
            "Registration rejected: email already in use"
        );
        return Err(ApiError::Conflict(
            "A user with this email already exists".to_string(),
        ));
    }

    // Check for an existing username
    let username_taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(&payload.username)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;
    if username_taken > 0 {
        warn!(
            username = %payload.username,
            "Registration rejected: username already in use"
        );
        return Err(ApiError::Conflict(
            "A user with this username already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;
    let user_id = generate_user_id();

    let insert = sqlx::query(
        r#"
        INSERT INTO users (id, email, username, first_name, last_name, password_hash, created_at)
        VALUES (?, ?, ?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(&user_id)
    .bind(&payload.email)
    .bind(&payload.username)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&password_hash)
    .execute(&state.db)
    .await;

    match insert {
        Ok(_) => {}
        // Lost the race against a concurrent registration with the same email or username
        Err(e) if is_unique_violation(&e) => {
            warn!(
                email = %safe_email_log(&payload.email),
                "Registration hit a uniqueness conflict on insert"
            );
            return Err(ApiError::Conflict(
                "A user with this email or username already exists".to_string(),
            ));
        }
        Err(e) => return Err(ApiError::DatabaseError(e)),
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&user_id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        "New user registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::from_user(&user, false)),
    ))
}

/// GET /api/users - List users (public, paginated)
pub async fn list_users(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    OptionalUser(viewer): OptionalUser,
    Query(params): Query<UserQueryParams>,
) -> Result<Json<UserListResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    // Parse pagination parameters with defaults
    let page = params.page.unwrap_or(1).max(1); // Ensure page is at least 1
    let limit = params.limit.unwrap_or(6).clamp(1, 100);
    let offset = (page - 1) * limit;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users ORDER BY username LIMIT ? OFFSET ?",
    )
    .bind(limit as i64)
    .bind(offset as i64)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let subscribed = subscribed_author_ids(&state, viewer.as_ref()).await?;
    let user_responses: Vec<UserResponse> = users
        .iter()
        .map(|u| UserResponse::from_user(u, subscribed.contains(&u.id)))
        .collect();

    debug!(
        user_count = user_responses.len(),
        total = total,
        page = page,
        limit = limit,
        "Successfully loaded paginated user list"
    );

    Ok(Json(UserListResponse {
        users: user_responses,
        total: total as usize,
        page,
        page_size: limit,
    }))
}

/// GET /api/users/me - Current user's own profile
pub async fn get_me(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<UserResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&authed.id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    // A user is never subscribed to themselves
    Ok(Json(UserResponse::from_user(&user, false)))
}

/// GET /api/users/:id - Public profile of a single user
pub async fn get_user(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    OptionalUser(viewer): OptionalUser,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound(format!("User not found: {}", user_id)))?;

    let is_subscribed = match &viewer {
        Some(v) => is_related(&state.db, RelationKind::Subscription, &v.id, &user.id)
            .await
            .map_err(ApiError::DatabaseError)?,
        None => false,
    };

    Ok(Json(UserResponse::from_user(&user, is_subscribed)))
}

/// Collects the ids of every author the viewer is subscribed to, so list
/// handlers can stamp `is_subscribed` without a query per row.
pub(crate) async fn subscribed_author_ids(
    state: &AppState,
    viewer: Option<&AuthedUser>,
) -> Result<HashSet<String>, ApiError> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    let ids: Vec<String> =
        sqlx::query_scalar("SELECT author_id FROM subscriptions WHERE subscriber_id = ?")
            .bind(&viewer.id)
            .fetch_all(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;
    Ok(ids.into_iter().collect())
}
