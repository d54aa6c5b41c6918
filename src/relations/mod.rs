//! # Relations Module
//!
//! One parametrized add/remove toggle over the three user-relation tables:
//! favorites, shopping cart entries, and author subscriptions. All three share
//! the same shape (a uniqueness-constrained join row owned by a user), so the
//! table specifics live in `RelationKind` instead of three copies of the code.

pub mod toggle;

#[cfg(test)]
mod tests;

pub use toggle::{add_relation, is_related, remove_relation, RelationError, RelationKind};
