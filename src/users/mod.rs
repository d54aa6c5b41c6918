// src/users/mod.rs

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;


pub use models::UserResponse;
pub use routes::users_routes;
