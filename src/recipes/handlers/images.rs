// src/recipes/handlers/images.rs

use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tokio::fs as tokio_fs;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::auth::AuthedUser;
use crate::common::images::{
    content_type_from_extension, delete_image, image_extension, is_valid_image_type,
    sanitize_filename, save_image, MAX_IMAGE_SIZE,
};
use crate::common::{generate_raw_id, ApiError, AppState};
use crate::recipes::handlers::crud::fetch_recipe;
use crate::recipes::models::{recipe_image_url, RecipeImageResponse};

/// POST /api/recipes/:id/image - Replace a recipe's image via multipart upload
pub async fn upload_recipe_image(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(recipe_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<RecipeImageResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let recipe = fetch_recipe(&state, &recipe_id).await?;
    if recipe.author_id != authed.id {
        warn!(
            recipe_id = %recipe_id,
            user_id = %authed.id,
            "Image upload rejected: not the author"
        );
        return Err(ApiError::Forbidden(
            "Only the author can replace this image".to_string(),
        ));
    }

    let mut file_data: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart request".to_string()))?
    {
        if field.name() == Some("image") {
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::BadRequest("Failed to read file data".to_string()))?
                    .to_vec(),
            );
        }
    }

    let data = file_data.ok_or_else(|| ApiError::BadRequest("No image provided".to_string()))?;

    if data.len() > MAX_IMAGE_SIZE {
        return Err(ApiError::BadRequest(
            "File size exceeds 5MB limit".to_string(),
        ));
    }
    if !is_valid_image_type(&data) {
        return Err(ApiError::BadRequest(
            "Invalid image type. Only JPEG, PNG, GIF, and WebP are supported".to_string(),
        ));
    }

    let extension = image_extension(&data).unwrap_or("jpg");
    let filename = format!("recipe_{}_{}.{}", recipe_id, generate_raw_id(8), extension);
    save_image(&state.recipe_images_dir, &filename, &data).await?;

    sqlx::query("UPDATE recipes SET image = ? WHERE id = ?")
        .bind(&filename)
        .bind(&recipe_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    if let Some(old) = &recipe.image {
        delete_image(&state.recipe_images_dir, old).await;
    }

    info!(recipe_id = %recipe_id, filename = %filename, "Recipe image replaced");

    Ok(Json(RecipeImageResponse {
        image: recipe_image_url(Some(&filename)),
    }))
}

/// GET /api/media/recipes/:filename - Serve recipe image files
pub async fn serve_recipe_image(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();

    // Sanitize filename to prevent path traversal
    let safe_filename = sanitize_filename(&filename);
    let file_path = state.recipe_images_dir.join(&safe_filename);

    if !file_path.exists() {
        return Err(ApiError::NotFound(format!(
            "Image not found: {}",
            safe_filename
        )));
    }

    let file_content = tokio_fs::read(&file_path)
        .await
        .map_err(|_| ApiError::InternalServer("Failed to read image file".to_string()))?;

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
