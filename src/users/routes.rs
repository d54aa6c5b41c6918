// src/users/routes.rs

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{accounts, avatar, subscriptions};

/// Create the users router with registration, profile, avatar and
/// subscription routes
pub fn users_routes() -> Router {
    Router::new()
        // Account routes
        .route(
            "/api/users",
            get(accounts::list_users).post(accounts::register_user),
        )
        .route("/api/users/me", get(accounts::get_me))
        .route(
            "/api/users/me/avatar",
            put(avatar::set_avatar).delete(avatar::delete_avatar),
        )
        // Subscription routes; the static segment wins over /api/users/:id
        .route(
            "/api/users/subscriptions",
            get(subscriptions::list_subscriptions),
        )
        .route("/api/users/:id", get(accounts::get_user))
        .route(
            "/api/users/:id/subscribe",
            post(subscriptions::subscribe).delete(subscriptions::unsubscribe),
        )
        // Avatar files
        .route("/api/media/avatars/:filename", get(avatar::serve_avatar))
}
