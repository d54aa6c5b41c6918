// src/users/models.rs

use serde::{Deserialize, Serialize};

use crate::auth::User;
use crate::recipes::models::RecipeShortResponse;

// ============================================================================
// Request Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SetAvatarRequest {
    /// Base64-encoded image, with or without a `data:image/...;base64,` header.
    pub avatar: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct UserQueryParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SubscriptionQueryParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Caps how many recipes are embedded per subscribed author.
    pub recipes_limit: Option<u32>,
}

// ============================================================================
// Response Models
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_subscribed: bool,
    pub avatar: String,
}

impl UserResponse {
    pub fn from_user(user: &User, is_subscribed: bool) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            is_subscribed,
            avatar: avatar_url(user.avatar.as_deref()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub avatar: String,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
}

/// A subscribed author together with a preview of their recipes.
#[derive(Debug, Serialize)]
pub struct SubscribedAuthorResponse {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_subscribed: bool,
    pub avatar: String,
    pub recipes: Vec<RecipeShortResponse>,
    pub recipes_count: i64,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionListResponse {
    pub authors: Vec<SubscribedAuthorResponse>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
}

/// Maps a stored avatar filename to its public URL, or "" when unset.
pub fn avatar_url(avatar: Option<&str>) -> String {
    match avatar {
        Some(filename) => format!("/api/media/avatars/{}", filename),
        None => String::new(),
    }
}
