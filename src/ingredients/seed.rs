// src/ingredients/seed.rs
//! Ingredient catalog seeding
//!
//! Loads `name,measurement_unit` lines from a CSV file into the catalog at
//! startup. INSERT OR IGNORE plus the UNIQUE(name, measurement_unit)
//! constraint makes reseeding idempotent.

use sqlx::SqlitePool;
use std::path::Path;
use tokio::fs as tokio_fs;
use tracing::{info, warn};

use crate::common::generate_ingredient_id;

/// Load ingredients from a CSV file
///
/// Ingredient names may themselves contain commas ("Pepper, ground"), so each
/// line is split on its LAST comma: everything before it is the name,
/// everything after is the unit. Quoted names are unwrapped.
///
/// Returns the number of newly inserted rows.
pub async fn seed_from_csv(pool: &SqlitePool, path: &Path) -> anyhow::Result<usize> {
    let content = tokio_fs::read_to_string(path).await?;

    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_name, raw_unit)) = line.rsplit_once(',') else {
            warn!(
                line = line_no + 1,
                file = %path.display(),
                "Skipping malformed ingredient line (no comma)"
            );
            skipped += 1;
            continue;
        };

        let name = raw_name.trim().trim_matches('"').trim();
        let unit = raw_unit.trim().trim_matches('"').trim();

        if name.is_empty() || unit.is_empty() {
            warn!(
                line = line_no + 1,
                file = %path.display(),
                "Skipping ingredient line with empty name or unit"
            );
            skipped += 1;
            continue;
        }

        let result = sqlx::query(
            "INSERT OR IGNORE INTO ingredients (id, name, measurement_unit) VALUES (?, ?, ?)",
        )
        .bind(generate_ingredient_id())
        .bind(name)
        .bind(unit)
        .execute(pool)
        .await?;

        inserted += result.rows_affected() as usize;
    }

    info!(
        inserted = inserted,
        skipped = skipped,
        file = %path.display(),
        "Ingredient catalog seeded"
    );

    Ok(inserted)
}
