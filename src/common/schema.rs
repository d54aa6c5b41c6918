// src/common/schema.rs
//! Database schema management
//!
//! Creates all tables idempotently at startup. Uniqueness of user relations
//! (favorites, shopping cart, subscriptions) and of ingredient usage inside a
//! recipe is enforced here, at the database level, so concurrent duplicate
//! inserts lose the race instead of corrupting state.

use sqlx::SqlitePool;
use std::env;
use tracing::{info, warn};

/// Create the full schema
///
/// Tables are created with CREATE TABLE IF NOT EXISTS so restarts preserve
/// data. Setting RESET_DB=true drops everything first.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Only drop tables if RESET_DB environment variable is set to "true"
    // This prevents data loss on server restarts
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("⚠️  RESET_DB=true - Dropping all tables and recreating schema...");
        drop_all_tables(pool).await?;
        info!("✅ Dropped old tables");
    }

    create_user_tables(pool).await?;
    create_catalog_tables(pool).await?;
    create_recipe_tables(pool).await?;
    create_relation_tables(pool).await?;
    create_indexes(pool).await?;

    info!("✅ Database schema ready");

    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Drop tables in reverse dependency order
    let tables = vec![
        "subscriptions",
        "shopping_cart",
        "favorites",
        "recipe_ingredients",
        "recipes",
        "ingredients",
        "users",
    ];

    for table in tables {
        let _ = sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await;
    }

    Ok(())
}

async fn create_user_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Users table
    // avatar holds a served-filename, not raw image bytes
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            username TEXT UNIQUE NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            avatar TEXT,
            created_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_catalog_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Ingredients catalog
    // The same name may appear under several measurement units (e.g. grams
    // and tablespoons), but (name, unit) pairs are unique
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ingredients (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            measurement_unit TEXT NOT NULL,
            UNIQUE(name, measurement_unit)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_recipe_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Recipes table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recipes (
            id TEXT PRIMARY KEY,
            author_id TEXT NOT NULL,
            name TEXT NOT NULL,
            image TEXT,
            text TEXT NOT NULL,
            cooking_time INTEGER NOT NULL CHECK (cooking_time >= 1),
            pub_date TEXT DEFAULT (datetime('now')),
            FOREIGN KEY(author_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Recipe ingredients junction table
    // One row per (recipe, ingredient); the amount lives here
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            id TEXT PRIMARY KEY,
            recipe_id TEXT NOT NULL,
            ingredient_id TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount >= 1),
            UNIQUE(recipe_id, ingredient_id),
            FOREIGN KEY(recipe_id) REFERENCES recipes(id) ON DELETE CASCADE,
            FOREIGN KEY(ingredient_id) REFERENCES ingredients(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_relation_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Favorites table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS favorites (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            recipe_id TEXT NOT NULL,
            created_at TEXT DEFAULT (datetime('now')),
            UNIQUE(user_id, recipe_id),
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY(recipe_id) REFERENCES recipes(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Shopping cart table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shopping_cart (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            recipe_id TEXT NOT NULL,
            created_at TEXT DEFAULT (datetime('now')),
            UNIQUE(user_id, recipe_id),
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY(recipe_id) REFERENCES recipes(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Subscriptions table
    // subscriber_id != author_id is checked in application code so it maps
    // to a clean validation error instead of a raw constraint failure
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subscriptions (
            id TEXT PRIMARY KEY,
            subscriber_id TEXT NOT NULL,
            author_id TEXT NOT NULL,
            created_at TEXT DEFAULT (datetime('now')),
            UNIQUE(subscriber_id, author_id),
            FOREIGN KEY(subscriber_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY(author_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let indexes = vec![
        // Ingredient prefix search
        "CREATE INDEX IF NOT EXISTS idx_ingredients_name ON ingredients(name)",
        // Recipe listing and author filter
        "CREATE INDEX IF NOT EXISTS idx_recipes_author ON recipes(author_id)",
        "CREATE INDEX IF NOT EXISTS idx_recipes_pub_date ON recipes(pub_date)",
        // Junction lookups
        "CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id)",
        "CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_ingredient ON recipe_ingredients(ingredient_id)",
        // Relation lookups by user
        "CREATE INDEX IF NOT EXISTS idx_favorites_user ON favorites(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_favorites_recipe ON favorites(recipe_id)",
        "CREATE INDEX IF NOT EXISTS idx_shopping_cart_user ON shopping_cart(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_shopping_cart_recipe ON shopping_cart(recipe_id)",
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_subscriber ON subscriptions(subscriber_id)",
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_author ON subscriptions(author_id)",
    ];

    for index_sql in indexes {
        sqlx::query(index_sql).execute(pool).await?;
    }

    Ok(())
}
