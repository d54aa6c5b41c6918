//! Authentication handlers

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::extractors::AuthedUser;
use super::models::{Claims, LoginPayload, TokenResponse, User};
use crate::common::{safe_email_log, ApiError, AppState};

/// POST /api/auth/token/login
/// Exchanges email + password for a JWT bearer token
///
/// # Request Body
/// ```json
/// {
///   "email": "cook@example.com",
///   "password": "secret"
/// }
/// ```
///
/// # Response
/// ```json
/// {
///   "auth_token": "<jwt token>"
/// }
/// ```
pub async fn login_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<TokenResponse>, ApiError> {
    info!("🔐 Login request received");
    let state = state_lock.read().await.clone();

    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&payload.email)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                email = %safe_email_log(&payload.email),
                "Database error during login lookup"
            );
            ApiError::DatabaseError(e)
        })?;

    // Unknown email and wrong password produce the same response so the
    // endpoint does not reveal which accounts exist
    let user = match user {
        Some(u) => u,
        None => {
            warn!(
                email = %safe_email_log(&payload.email),
                "Login failed: unknown email"
            );
            return Err(ApiError::Unauthorized(
                "invalid email or password".to_string(),
            ));
        }
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(
            user_id = %user.id,
            email = %safe_email_log(&user.email),
            "Login failed: password mismatch"
        );
        return Err(ApiError::Unauthorized(
            "invalid email or password".to_string(),
        ));
    }

    let token = mint_token(&user.id, &state.jwt_secret)?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        "User login successful"
    );

    Ok(Json(TokenResponse { auth_token: token }))
}

/// POST /api/auth/token/logout
/// Logout endpoint - since we're using JWT tokens, logout is handled client-side
/// This endpoint just returns 204 to confirm the logout request
pub async fn logout_handler(authed: AuthedUser) -> Result<StatusCode, ApiError> {
    info!(user_id = %authed.id, "User logout successful");
    Ok(StatusCode::NO_CONTENT)
}

// ---- Helper Functions ----

/// Create a signed JWT for the given user id, valid for 24 hours
pub fn mint_token(user_id: &str, jwt_secret: &str) -> Result<String, ApiError> {
    let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        error!(error = %e, user_id = %user_id, "JWT encoding error");
        ApiError::InternalServer("jwt error".to_string())
    })
}

/// Hash a password with argon2 and a fresh random salt
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "Password hashing failed");
            ApiError::InternalServer("password hashing failed".to_string())
        })
}

/// Verify a password against a stored argon2 hash
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(password_hash) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Stored password hash is malformed");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
