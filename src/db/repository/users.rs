//! Cached panel accounts repository

use serde_json::Value;
use sqlx::PgPool;

use crate::db::models::{UserRow, UserServerInfoRow};

/// Find an active account matching the exact (username, password) pair
pub async fn find_active(
    pool: &PgPool,
    username: &str,
    password: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, password
        FROM users
        WHERE username = $1 AND password = $2 AND status = 'Active'
        "#,
    )
    .bind(username)
    .bind(password)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Insert an account, reusing the existing row for a known
/// (username, password) pair. Returns the row id either way.
pub async fn insert_or_get(
    pool: &PgPool,
    username: &str,
    password: &str,
) -> Result<i32, sqlx::Error> {
    let row: (i32,) = sqlx::query_as(
        r#"
        INSERT INTO users (username, password)
        VALUES ($1, $2)
        ON CONFLICT (username, password) DO UPDATE SET username = EXCLUDED.username
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(password)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

/// Upsert the cached panel documents for an account (one row per user)
pub async fn upsert_server_info(
    pool: &PgPool,
    user_id: i32,
    user_info: &Value,
    server_info: &Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_server_info (user_id, user_info, server_info)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE SET
            user_info = EXCLUDED.user_info,
            server_info = EXCLUDED.server_info,
            updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(user_info)
    .bind(server_info)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get the cached panel documents for an account
pub async fn get_server_info(
    pool: &PgPool,
    user_id: i32,
) -> Result<Option<UserServerInfoRow>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserServerInfoRow>(
        r#"
        SELECT id, user_id, user_info, server_info, updated_at
        FROM user_server_info
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
