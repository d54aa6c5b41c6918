// src/recipes/validators.rs

use std::collections::HashSet;

use super::models::RecipeWriteRequest;
use crate::common::{ValidationResult, Validator};

// ============================================================================
// Recipe Write Validator
// ============================================================================

pub struct RecipeValidator;

impl Validator<RecipeWriteRequest> for RecipeValidator {
    fn validate(&self, data: &RecipeWriteRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        // Validate name
        if data.name.trim().is_empty() {
            result.add_error("name", "Recipe name is required");
        } else if data.name.len() > 256 {
            result.add_error("name", "Recipe name must be less than 256 characters");
        }

        // Validate text
        if data.text.trim().is_empty() {
            result.add_error("text", "Recipe text is required");
        }

        // Validate cooking_time
        if data.cooking_time < 1 {
            result.add_error("cooking_time", "Cooking time must be at least 1 minute");
        }

        // Validate ingredients
        if data.ingredients.is_empty() {
            result.add_error("ingredients", "At least one ingredient is required");
        } else {
            let mut seen = HashSet::new();
            for ingredient in &data.ingredients {
                if ingredient.id.trim().is_empty() {
                    result.add_error("ingredients", "Ingredient id is required");
                } else if !seen.insert(ingredient.id.as_str()) {
                    result.add_error(
                        "ingredients",
                        &format!("Duplicate ingredient id: {}", ingredient.id),
                    );
                }
                if ingredient.amount < 1 {
                    result.add_error(
                        "ingredients",
                        &format!("Amount for ingredient {} must be at least 1", ingredient.id),
                    );
                }
            }
        }

        result
    }
}
