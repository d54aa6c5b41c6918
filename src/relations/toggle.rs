// src/relations/toggle.rs
//! Parametrized user-relation toggle

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, warn};

use crate::common::error::is_unique_violation;
use crate::common::{
    generate_cart_entry_id, generate_favorite_id, generate_subscription_id, ApiError,
};

/// The three user-owned relation tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Favorite,
    ShoppingCart,
    Subscription,
}

impl RelationKind {
    pub(crate) fn table(&self) -> &'static str {
        match self {
            RelationKind::Favorite => "favorites",
            RelationKind::ShoppingCart => "shopping_cart",
            RelationKind::Subscription => "subscriptions",
        }
    }

    pub(crate) fn user_column(&self) -> &'static str {
        match self {
            RelationKind::Favorite | RelationKind::ShoppingCart => "user_id",
            RelationKind::Subscription => "subscriber_id",
        }
    }

    pub(crate) fn target_column(&self) -> &'static str {
        match self {
            RelationKind::Favorite | RelationKind::ShoppingCart => "recipe_id",
            RelationKind::Subscription => "author_id",
        }
    }

    fn generate_id(&self) -> String {
        match self {
            RelationKind::Favorite => generate_favorite_id(),
            RelationKind::ShoppingCart => generate_cart_entry_id(),
            RelationKind::Subscription => generate_subscription_id(),
        }
    }

    fn already_exists_message(&self) -> &'static str {
        match self {
            RelationKind::Favorite => "recipe is already in favorites",
            RelationKind::ShoppingCart => "recipe is already in shopping cart",
            RelationKind::Subscription => "already subscribed to this author",
        }
    }

    fn not_related_message(&self) -> &'static str {
        match self {
            RelationKind::Favorite => "recipe is not in favorites",
            RelationKind::ShoppingCart => "recipe is not in shopping cart",
            RelationKind::Subscription => "not subscribed to this author",
        }
    }
}

/// Toggle failures
#[derive(Debug, Error)]
pub enum RelationError {
    #[error("{}", .0.already_exists_message())]
    AlreadyExists(RelationKind),

    #[error("{}", .0.not_related_message())]
    NotRelated(RelationKind),

    #[error("cannot subscribe to yourself")]
    SelfSubscription,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<RelationError> for ApiError {
    fn from(err: RelationError) -> Self {
        match err {
            RelationError::AlreadyExists(_)
            | RelationError::NotRelated(_)
            | RelationError::SelfSubscription => ApiError::Conflict(err.to_string()),
            RelationError::Database(e) => ApiError::DatabaseError(e),
        }
    }
}

/// Add a relation row for (user, target)
///
/// The duplicate check is advisory; the UNIQUE constraint on the table is
/// what actually guarantees at most one row. A constraint violation from a
/// lost race comes back as the same `AlreadyExists` as the checked path.
pub async fn add_relation(
    db: &SqlitePool,
    kind: RelationKind,
    user_id: &str,
    target_id: &str,
) -> Result<(), RelationError> {
    if kind == RelationKind::Subscription && user_id == target_id {
        warn!(user_id = %user_id, "Rejected self-subscription attempt");
        return Err(RelationError::SelfSubscription);
    }

    let existing: Option<(String,)> = sqlx::query_as(&format!(
        "SELECT id FROM {} WHERE {} = ? AND {} = ?",
        kind.table(),
        kind.user_column(),
        kind.target_column(),
    ))
    .bind(user_id)
    .bind(target_id)
    .fetch_optional(db)
    .await?;

    if existing.is_some() {
        return Err(RelationError::AlreadyExists(kind));
    }

    let id = kind.generate_id();
    let insert = sqlx::query(&format!(
        "INSERT INTO {} (id, {}, {}, created_at) VALUES (?, ?, ?, datetime('now'))",
        kind.table(),
        kind.user_column(),
        kind.target_column(),
    ))
    .bind(&id)
    .bind(user_id)
    .bind(target_id)
    .execute(db)
    .await;

    match insert {
        Ok(_) => {
            debug!(
                kind = ?kind,
                user_id = %user_id,
                target_id = %target_id,
                "Relation added"
            );
            Ok(())
        }
        Err(e) if is_unique_violation(&e) => {
            // Lost the race against a concurrent identical insert
            Err(RelationError::AlreadyExists(kind))
        }
        Err(e) => Err(RelationError::Database(e)),
    }
}

/// Remove the relation row for (user, target)
///
/// Removing a relation that was never added is a client error, not a no-op.
pub async fn remove_relation(
    db: &SqlitePool,
    kind: RelationKind,
    user_id: &str,
    target_id: &str,
) -> Result<(), RelationError> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE {} = ? AND {} = ?",
        kind.table(),
        kind.user_column(),
        kind.target_column(),
    ))
    .bind(user_id)
    .bind(target_id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RelationError::NotRelated(kind));
    }

    debug!(
        kind = ?kind,
        user_id = %user_id,
        target_id = %target_id,
        "Relation removed"
    );

    Ok(())
}

/// Existence check for the viewer-dependent projection flags
///
/// Anonymous viewers pass no user id and handlers short-circuit to false
/// before calling this.
pub async fn is_related(
    db: &SqlitePool,
    kind: RelationKind,
    user_id: &str,
    target_id: &str,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ? AND {} = ?",
        kind.table(),
        kind.user_column(),
        kind.target_column(),
    ))
    .bind(user_id)
    .bind(target_id)
    .fetch_one(db)
    .await?;

    Ok(count > 0)
}
