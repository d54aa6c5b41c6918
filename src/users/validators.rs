// src/users/validators.rs

use std::sync::LazyLock;

use regex::Regex;

use super::models::RegisterUserRequest;
use crate::common::{ValidationResult, Validator};

// Same character set Django's username validator accepts.
static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

// ============================================================================
// Registration Validator
// ============================================================================

pub struct RegisterValidator;

impl Validator<RegisterUserRequest> for RegisterValidator {
    fn validate(&self, data: &RegisterUserRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        // Validate email
        if data.email.trim().is_empty() {
            result.add_error("email", "Email is required");
        } else if !data.email.contains('@') {
            result.add_error("email", "Email must be a valid email address");
        } else if data.email.len() > 254 {
            result.add_error("email", "Email must be less than 254 characters");
        }

        // Validate username
        if data.username.trim().is_empty() {
            result.add_error("username", "Username is required");
        } else if data.username.len() > 150 {
            result.add_error("username", "Username must be less than 150 characters");
        } else if data.username == "me" {
            result.add_error("username", "This username is reserved");
        } else if !USERNAME_RE.is_match(&data.username) {
            result.add_error(
                "username",
                "Username may only contain letters, digits and @/./+/-/_ characters",
            );
        }

        // Validate first_name
        if data.first_name.trim().is_empty() {
            result.add_error("first_name", "First name is required");
        } else if data.first_name.len() > 150 {
            result.add_error("first_name", "First name must be less than 150 characters");
        }

        // Validate last_name
        if data.last_name.trim().is_empty() {
            result.add_error("last_name", "Last name is required");
        } else if data.last_name.len() > 150 {
            result.add_error("last_name", "Last name must be less than 150 characters");
        }

        // Validate password
        if data.password.len() < 8 {
            result.add_error("password", "Password must be at least 8 characters");
        } else if data.password.len() > 128 {
            result.add_error("password", "Password must be less than 128 characters");
        }

        result
    }
}
