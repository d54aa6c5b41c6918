//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Token login/logout endpoints
//! - JWT token generation and validation
//! - Password hashing and verification
//! - AuthedUser / OptionalUser extractors for protected routes

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;


pub use extractors::{AuthedUser, OptionalUser};
pub use models::User;
pub use routes::auth_routes;
