use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum::Extension;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::user_repo;
use crate::errors::AppError;
use crate::models::{Role, User};
use crate::AppState;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// JWT payload. `sub` is the username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

/// The authenticated, active user for the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

// ---------------------------------------------------------------------------
// Passwords
// ---------------------------------------------------------------------------

/// Argon2id hash in PHC string format.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    PasswordHash::new(hashed)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

pub fn issue_token(
    username: &str,
    role: Role,
    secret: &str,
    ttl_minutes: i64,
) -> Result<String, AuthError> {
    let claims = Claims {
        sub: username.to_string(),
        role,
        exp: (Utc::now() + Duration::minutes(ttl_minutes)).timestamp().max(0) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

fn credentials_error() -> AppError {
    AppError::Unauthorized("Could not validate credentials".into())
}

/// Bearer-token authentication middleware.
///
/// Every request must carry `Authorization: Bearer <jwt>` issued by
/// `/api/login` for an existing, active user. The user is attached to the
/// request as a [`CurrentUser`] extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;
    let claims =
        decode_token(token, &state.config.secret_key).map_err(|_| credentials_error())?;

    let user = user_repo::get_user_by_username(&state.db, &claims.sub)
        .await?
        .ok_or_else(credentials_error)?;

    if !user.valid {
        return Err(AppError::BadRequest("Inactive user".into()));
    }

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Layered inside [`require_auth`]; rejects non-admin users.
pub async fn require_admin(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !user.is_admin() {
        tracing::warn!(user = %user.username, path = %req.uri().path(), "Admin route refused");
        return Err(AppError::Forbidden);
    }
    Ok(next.run(req).await)
}
