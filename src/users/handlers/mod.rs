// src/users/handlers/mod.rs

pub mod accounts;
pub mod avatar;
pub mod subscriptions;

pub use accounts::*;
pub use avatar::*;
pub use subscriptions::*;
