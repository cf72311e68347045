use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Role, User};

/// Insert a new user with an already hashed password.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    hashed_password: &str,
    role: Role,
    initial_capital: Decimal,
) -> anyhow::Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, hashed_password, role, initial_capital)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(hashed_password)
    .bind(role.as_str())
    .bind(initial_capital)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn get_user_by_id(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn get_user_by_username(pool: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// True if another account already uses this username or email.
pub async fn identity_taken(
    pool: &PgPool,
    username: &str,
    email: &str,
    exclude_id: Option<Uuid>,
) -> anyhow::Result<bool> {
    let row: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM users
            WHERE (username = $1 OR email = $2) AND ($3::uuid IS NULL OR id <> $3)
        )
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

pub async fn list_users(pool: &PgPool) -> anyhow::Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at, username")
        .fetch_all(pool)
        .await?;

    Ok(users)
}

/// Fields an update may change. `None` leaves the stored value.
#[derive(Debug, Default)]
pub struct UserChanges<'a> {
    pub username: Option<&'a str>,
    pub email: Option<&'a str>,
    pub hashed_password: Option<&'a str>,
    pub valid: Option<bool>,
    pub role: Option<Role>,
    pub initial_capital: Option<Decimal>,
}

pub async fn update_user(
    pool: &PgPool,
    id: Uuid,
    changes: &UserChanges<'_>,
) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            username        = COALESCE($2, username),
            email           = COALESCE($3, email),
            hashed_password = COALESCE($4, hashed_password),
            valid           = COALESCE($5, valid),
            role            = COALESCE($6, role),
            initial_capital = COALESCE($7, initial_capital)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(changes.username)
    .bind(changes.email)
    .bind(changes.hashed_password)
    .bind(changes.valid)
    .bind(changes.role.map(|r| r.as_str()))
    .bind(changes.initial_capital)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn set_password(pool: &PgPool, id: Uuid, hashed_password: &str) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET hashed_password = $2 WHERE id = $1")
        .bind(id)
        .bind(hashed_password)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_avatar(pool: &PgPool, id: Uuid, avatar: &str) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET avatar = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(avatar)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}
