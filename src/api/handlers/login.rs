use axum::extract::State;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::api::auth::{issue_token, verify_password};
use crate::db::user_repo;
use crate::errors::AppError;
use crate::models::Role;
use crate::AppState;

/// OAuth2 password-flow form.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub role: Role,
}

/// POST /api/login: exchange credentials for a bearer token
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = user_repo::get_user_by_username(&state.db, &form.username)
        .await?
        .filter(|u| verify_password(&form.password, &u.hashed_password))
        .ok_or_else(|| AppError::Unauthorized("Incorrect username or password".into()))?;

    let token = issue_token(
        &user.username,
        user.role(),
        &state.config.secret_key,
        state.config.access_token_expire_minutes,
    )
    .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(user = %user.username, "User logged in");

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer",
        role: user.role(),
    }))
}
