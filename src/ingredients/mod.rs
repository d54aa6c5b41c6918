//! # Ingredients Module
//!
//! Read-only ingredient catalog: listing with a name prefix filter, retrieval
//! by id, and CSV seeding at startup. Recipes reference catalog entries by id
//! and attach amounts in their own join table.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;


pub use models::Ingredient;
pub use routes::ingredients_routes;
