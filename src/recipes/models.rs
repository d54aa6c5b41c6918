// src/recipes/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::users::UserResponse;

// ============================================================================
// Recipe Models
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: String,
    pub author_id: String,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i64,
    pub pub_date: Option<String>,
}

// ============================================================================
// Request Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct IngredientAmountRequest {
    pub id: String,
    pub amount: i64,
}

/// Write payload shared by create and update. Create requires `image`;
/// update keeps the stored file when it is absent.
#[derive(Debug, Deserialize)]
pub struct RecipeWriteRequest {
    pub ingredients: Vec<IngredientAmountRequest>,
    pub image: Option<String>,
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
}

#[derive(Debug, Deserialize, Default)]
pub struct RecipeQueryParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub author: Option<String>,
    pub is_favorited: Option<String>,
    pub is_in_shopping_cart: Option<String>,
}

// ============================================================================
// Response Models
// ============================================================================

#[derive(Debug, Serialize)]
pub struct IngredientAmountResponse {
    pub id: String,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: String,
    pub author: UserResponse,
    pub ingredients: Vec<IngredientAmountResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
    pub pub_date: Option<String>,
}

/// Short representation used by toggle responses and subscription listings
#[derive(Debug, Clone, Serialize)]
pub struct RecipeShortResponse {
    pub id: String,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

impl RecipeShortResponse {
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id.clone(),
            name: recipe.name.clone(),
            image: recipe_image_url(recipe.image.as_deref()),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeListResponse {
    pub recipes: Vec<RecipeResponse>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Serialize)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

#[derive(Debug, Serialize)]
pub struct RecipeImageResponse {
    pub image: String,
}

/// Maps a stored recipe image filename to its public URL, or "" when unset.
pub fn recipe_image_url(image: Option<&str>) -> String {
    match image {
        Some(filename) => format!("/api/media/recipes/{}", filename),
        None => String::new(),
    }
}
