// src/recipes/mod.rs

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use models::{Recipe, RecipeShortResponse};
pub use routes::recipes_routes;
