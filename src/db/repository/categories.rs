//! Stream categories repository

use sqlx::PgPool;

use crate::db::models::CategoryRow;

/// All active categories in gateway display order
pub async fn list_active(pool: &PgPool) -> Result<Vec<CategoryRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        r#"
        SELECT id, category_name, parent_id, cat_order, status
        FROM stream_categories
        WHERE status = 'Active'
        ORDER BY cat_order ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Look up a category by its upstream-assigned id
pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<CategoryRow>, sqlx::Error> {
    let row = sqlx::query_as::<_, CategoryRow>(
        r#"
        SELECT id, category_name, parent_id, cat_order, status
        FROM stream_categories
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Highest gateway-assigned display order, 0 when the table is empty
pub async fn max_order(pool: &PgPool) -> Result<i32, sqlx::Error> {
    let row: (i32,) = sqlx::query_as("SELECT COALESCE(MAX(cat_order), 0) FROM stream_categories")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

/// Insert a category with a gateway-assigned display order
pub async fn insert(
    pool: &PgPool,
    id: i32,
    category_name: &str,
    parent_id: i32,
    cat_order: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO stream_categories (id, category_name, parent_id, cat_order)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind(category_name)
    .bind(parent_id)
    .bind(cat_order)
    .execute(pool)
    .await?;

    Ok(())
}

/// Rename a category; display order and status are left alone
pub async fn update_name(pool: &PgPool, id: i32, category_name: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE stream_categories SET category_name = $2 WHERE id = $1")
        .bind(id)
        .bind(category_name)
        .execute(pool)
        .await?;

    Ok(())
}
