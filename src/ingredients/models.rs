//! Ingredient data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Ingredient catalog entry
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    pub measurement_unit: String,
}

/// Query parameters for ingredient listing
#[derive(Deserialize, Default)]
pub struct IngredientQueryParams {
    /// Case-insensitive name prefix filter
    pub name: Option<String>,
}
