use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::{hash_password, verify_password, CurrentUser};
use crate::db::user_repo::{self, UserChanges};
use crate::errors::AppError;
use crate::models::{Role, User};
use crate::AppState;

use super::{read_upload, ApiResponse};

const AVATAR_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    pub initial_capital: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub valid: Option<bool>,
    pub role: Option<Role>,
    pub initial_capital: Option<Decimal>,
}

impl UpdateUserRequest {
    fn touches_privileges(&self) -> bool {
        self.valid.is_some() || self.role.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

fn hash(password: &str) -> Result<String, AppError> {
    if password.is_empty() {
        return Err(AppError::BadRequest("password must not be empty".into()));
    }
    hash_password(password).map_err(|e| AppError::Internal(e.into()))
}

/// Trimmed identity value; usernames and emails may never be blank.
fn identity(value: &str, what: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Lowercased extension if it names a supported image format.
fn avatar_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    AVATAR_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

fn content_type_for(file_name: &str) -> &'static str {
    match avatar_extension(file_name).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// GET /api/users/me
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<ApiResponse<User>> {
    Json(ApiResponse::ok(user))
}

/// POST /api/users/me/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if !verify_password(&body.current_password, &user.hashed_password) {
        return Err(AppError::BadRequest("Incorrect current password".into()));
    }

    let hashed = hash(&body.new_password)?;
    user_repo::set_password(&state.db, user.id, &hashed).await?;
    tracing::info!(user = %user.username, "Password changed");

    Ok(Json(ApiResponse::ok(())))
}

/// GET /api/users (admin)
pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    let users = user_repo::list_users(&state.db).await?;
    Ok(Json(ApiResponse::ok(users)))
}

/// POST /api/users (admin)
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let username = identity(&body.username, "username")?;
    let email = identity(&body.email, "email")?;

    if user_repo::identity_taken(&state.db, &username, &email, None).await? {
        return Err(AppError::BadRequest("Username already exists".into()));
    }

    let hashed = hash(&body.password)?;
    let user = user_repo::create_user(
        &state.db,
        &username,
        &email,
        &hashed,
        body.role,
        body.initial_capital.unwrap_or(Decimal::ONE_THOUSAND),
    )
    .await?;

    tracing::info!(user = %user.username, role = %user.role(), "User created");

    Ok(Json(ApiResponse::ok(user)))
}

/// PUT /api/users/{id}: admins may edit anyone, others only themselves
pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    if !actor.is_admin() && (actor.id != id || body.touches_privileges()) {
        return Err(AppError::Forbidden);
    }

    let username = body
        .username
        .as_deref()
        .map(|u| identity(u, "username"))
        .transpose()?;
    let email = body
        .email
        .as_deref()
        .map(|e| identity(e, "email"))
        .transpose()?;

    let target = user_repo::get_user_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;

    if username.is_some() || email.is_some() {
        let taken = user_repo::identity_taken(
            &state.db,
            username.as_deref().unwrap_or(&target.username),
            email.as_deref().unwrap_or(&target.email),
            Some(id),
        )
        .await?;
        if taken {
            return Err(AppError::BadRequest("Username or email already in use".into()));
        }
    }

    let hashed = body.password.as_deref().map(hash).transpose()?;
    let changes = UserChanges {
        username: username.as_deref(),
        email: email.as_deref(),
        hashed_password: hashed.as_deref(),
        valid: body.valid,
        role: body.role,
        initial_capital: body.initial_capital,
    };

    let user = user_repo::update_user(&state.db, id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;

    Ok(Json(ApiResponse::ok(user)))
}

/// POST /api/users/{id}/avatar
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<User>>, AppError> {
    if !actor.is_admin() && actor.id != id {
        return Err(AppError::Forbidden);
    }

    let upload = read_upload(multipart).await?;
    let ext = upload
        .file_name
        .as_deref()
        .and_then(avatar_extension)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "avatar must be one of: {}",
                AVATAR_EXTENSIONS.join(", ")
            ))
        })?;

    let file_name = format!("{id}.{ext}");
    let dir = std::path::Path::new(&state.config.avatar_dir);
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    tokio::fs::write(dir.join(&file_name), &upload.bytes)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let user = user_repo::set_avatar(&state.db, id, &file_name)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;

    tracing::info!(user = %user.username, avatar = %file_name, "Avatar stored");

    Ok(Json(ApiResponse::ok(user)))
}

/// GET /api/users/{id}/avatar
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let avatar = user_repo::get_user_by_id(&state.db, id)
        .await?
        .and_then(|u| u.avatar)
        .ok_or_else(|| AppError::NotFound("avatar not found".into()))?;

    let path = std::path::Path::new(&state.config.avatar_dir).join(&avatar);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| AppError::NotFound("avatar not found".into()))?;

    Ok(([(header::CONTENT_TYPE, content_type_for(&avatar))], bytes))
}
