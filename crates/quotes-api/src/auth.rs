use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use tracing::{info, warn};

use quotes_db::is_unique_violation;
use quotes_types::api::{AuthResponse, LoginRequest, RegisterRequest};

use crate::error::ApiError;
use crate::state::AppState;

const DUPLICATE_USER: &str = "User with this email or username already exists";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(req) = payload?;
    req.validate().map_err(ApiError::Validation)?;

    let (email, username) = (req.email.clone(), req.username.clone());
    if state
        .db_call(move |db| db.user_exists(&email, &username))
        .await?
    {
        return Err(ApiError::Conflict(DUPLICATE_USER.into()));
    }

    let password_hash = hash_password(&req.password)?;

    // A concurrent registration can still win the race to the UNIQUE index.
    let RegisterRequest {
        username, email, ..
    } = req;
    let user = state
        .db_call(move |db| match db.create_user(&username, &email, &password_hash) {
            Ok(user) => Ok(Some(user)),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e),
        })
        .await?
        .ok_or_else(|| ApiError::Conflict(DUPLICATE_USER.into()))?;

    let token = state.tokens.issue(user.id, &user.username)?;
    info!("Registered user {} ({})", user.id, user.username);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into_user(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(req) = payload?;
    req.validate().map_err(ApiError::Validation)?;

    let email = req.email.clone();
    let user = state
        .db_call(move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(|| {
            warn!("Login failed: no account for {}", req.email);
            ApiError::Unauthorized(INVALID_CREDENTIALS.into())
        })?;

    if !verify_password(&req.password, &user.password_hash)? {
        warn!("Login failed: wrong password for user {}", user.id);
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = state.tokens.issue(user.id, &user.username)?;

    Ok(Json(AuthResponse {
        token,
        user: user.into_user(),
    }))
}

/// Argon2id with a fresh random salt, PHC string encoded.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

/// Check `password` against a stored PHC hash. A malformed hash is an internal error.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unreadable: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
