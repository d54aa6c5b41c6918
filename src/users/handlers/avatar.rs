// src/users/handlers/avatar.rs

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tokio::fs as tokio_fs;
use tokio::sync::RwLock;
use tracing::info;

use crate::auth::AuthedUser;
use crate::common::images::{
    content_type_from_extension, decode_base64_image, delete_image, sanitize_filename, save_image,
};
use crate::common::{generate_raw_id, ApiError, AppState};
use crate::users::models::{avatar_url, AvatarResponse, SetAvatarRequest};

/// PUT /api/users/me/avatar - Set the current user's avatar from base64 data
pub async fn set_avatar(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<SetAvatarRequest>,
) -> Result<Json<AvatarResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    if request.avatar.trim().is_empty() {
        return Err(ApiError::BadRequest("No avatar data provided".to_string()));
    }

    let decoded = decode_base64_image(&request.avatar)?;
    let filename = format!(
        "avatar_{}_{}.{}",
        authed.id,
        generate_raw_id(8),
        decoded.extension
    );
    save_image(&state.avatars_dir, &filename, &decoded.data).await?;

    let old_avatar: Option<String> = sqlx::query_scalar("SELECT avatar FROM users WHERE id = ?")
        .bind(&authed.id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    sqlx::query("UPDATE users SET avatar = ? WHERE id = ?")
        .bind(&filename)
        .bind(&authed.id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    // The replaced file is unreferenced once the row points at the new one
    if let Some(old) = old_avatar {
        delete_image(&state.avatars_dir, &old).await;
    }

    info!(user_id = %authed.id, filename = %filename, "Avatar updated");

    Ok(Json(AvatarResponse {
        avatar: avatar_url(Some(&filename)),
    }))
}

/// DELETE /api/users/me/avatar - Remove the current user's avatar
pub async fn delete_avatar(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<StatusCode, ApiError> {
    let state = state_lock.read().await.clone();

    let old_avatar: Option<String> = sqlx::query_scalar("SELECT avatar FROM users WHERE id = ?")
        .bind(&authed.id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    sqlx::query("UPDATE users SET avatar = NULL WHERE id = ?")
        .bind(&authed.id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    if let Some(old) = old_avatar {
        delete_image(&state.avatars_dir, &old).await;
    }

    info!(user_id = %authed.id, "Avatar removed");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/media/avatars/:filename - Serve avatar files
pub async fn serve_avatar(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();

    // Sanitize filename to prevent path traversal
    let safe_filename = sanitize_filename(&filename);
    let file_path = state.avatars_dir.join(&safe_filename);

    if !file_path.exists() {
        return Err(ApiError::NotFound(format!(
            "Avatar not found: {}",
            safe_filename
        )));
    }

    let file_content = tokio_fs::read(&file_path)
        .await
        .map_err(|_| ApiError::InternalServer("Failed to read avatar file".to_string()))?;

    let content_type = content_type_from_extension(&safe_filename);

    Ok((
        StatusCode::OK,
        [
            ("Content-Type", content_type),
            ("Cache-Control", "public, max-age=31536000"), // 1 year cache
        ],
        file_content,
    ))
}
