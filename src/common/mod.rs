// Common module - shared types and utilities across all modules

pub mod error;
pub mod helpers;
pub mod id_generator;
pub mod images;
pub mod schema;
pub mod state;
pub mod validation;

// Re-export commonly used types for convenience
pub use error::{is_unique_violation, ApiError};
pub use helpers::safe_email_log;
pub use id_generator::*;
pub use state::AppState;
pub use validation::{ValidationError, ValidationResult, Validator};
