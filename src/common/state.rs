// Application state shared across all modules

use sqlx::SqlitePool;
use std::path::PathBuf;

/// Application state containing the database pool and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub avatars_dir: PathBuf,
    pub recipe_images_dir: PathBuf,
    pub jwt_secret: String,
    /// Public base URL of the deployment, used to build shareable short links.
    pub base_url: String,
}
