// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates human-readable, prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXX (e.g., R_K7NP3X for recipes)
//!
//! Benefits:
//! - No ambiguous characters (excludes I, L, O, U)
//! - Case-insensitive
//! - ~1 billion combinations per entity type (32^6)
//! - Easy to read, type, and communicate verbally

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// User account (U_)
    User,
    /// Recipe (R_)
    Recipe,
    /// Ingredient catalog entry (I_)
    Ingredient,
    /// Recipe-ingredient join row (X_) - X for miX
    RecipeIngredient,
    /// Favorite relation (F_)
    Favorite,
    /// Shopping-cart entry (C_)
    CartEntry,
    /// Subscription relation (S_)
    Subscription,
}

impl EntityPrefix {
    /// Get the string prefix for this entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "U",
            EntityPrefix::Recipe => "R",
            EntityPrefix::Ingredient => "I",
            EntityPrefix::RecipeIngredient => "X",
            EntityPrefix::Favorite => "F",
            EntityPrefix::CartEntry => "C",
            EntityPrefix::Subscription => "S",
        }
    }
}

/// Generate a random Crockford Base32 string of specified length
fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID using Crockford Base32 encoding
///
/// # Arguments
/// * `prefix` - The entity type prefix
///
/// # Returns
/// A string in format "PREFIX_XXXXXX" (e.g., "R_K7NP3X")
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(6))
}

/// Generate a raw Crockford Base32 string without prefix
/// Useful for filenames or other non-entity identifiers
pub fn generate_raw_id(length: usize) -> String {
    generate_crockford_string(length)
}

// ============================================================================
// Convenience functions for each entity type
// ============================================================================

/// Generate a User ID (U_XXXXXX)
pub fn generate_user_id() -> String {
    generate_id(EntityPrefix::User)
}

/// Generate a Recipe ID (R_XXXXXX)
pub fn generate_recipe_id() -> String {
    generate_id(EntityPrefix::Recipe)
}

/// Generate an Ingredient ID (I_XXXXXX)
pub fn generate_ingredient_id() -> String {
    generate_id(EntityPrefix::Ingredient)
}

/// Generate a RecipeIngredient ID (X_XXXXXX)
pub fn generate_recipe_ingredient_id() -> String {
    generate_id(EntityPrefix::RecipeIngredient)
}

/// Generate a Favorite ID (F_XXXXXX)
pub fn generate_favorite_id() -> String {
    generate_id(EntityPrefix::Favorite)
}

/// Generate a CartEntry ID (C_XXXXXX)
pub fn generate_cart_entry_id() -> String {
    generate_id(EntityPrefix::CartEntry)
}

/// Generate a Subscription ID (S_XXXXXX)
pub fn generate_subscription_id() -> String {
    generate_id(EntityPrefix::Subscription)
}
