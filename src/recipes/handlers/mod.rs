// src/recipes/handlers/mod.rs

pub mod crud;
pub mod images;
pub mod links;
pub mod relations;
pub mod shopping_list;

pub use crud::*;
pub use images::*;
pub use links::*;
pub use relations::*;
pub use shopping_list::*;
