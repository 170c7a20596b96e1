//! Live streams repository
//!
//! Reconciliation is keyed by the upstream-assigned stream_id, never by
//! display name.

use sqlx::PgPool;

use crate::db::models::{NewStream, StreamRow};

const STREAM_COLUMNS: &str = "st.id, st.num, st.name, st.stream_type, st.stream_id, \
     st.stream_icon, st.epg_channel_id, st.added, st.is_adult, st.category_id, \
     st.category_ids, st.custom_sid, st.tv_archive, st.direct_source, \
     st.tv_archive_duration, st.status";

/// All active streams whose category is also active, ordered by name
pub async fn list_active(pool: &PgPool) -> Result<Vec<StreamRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {STREAM_COLUMNS}
        FROM streams AS st
        INNER JOIN stream_categories AS st_cat ON st.category_id = st_cat.id
        WHERE st.status = 'Active' AND st_cat.status = 'Active'
        ORDER BY st.name ASC
        "#
    );

    sqlx::query_as::<_, StreamRow>(&sql).fetch_all(pool).await
}

/// Active streams in one category, ordered by name
pub async fn list_by_category(
    pool: &PgPool,
    category_id: i32,
) -> Result<Vec<StreamRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {STREAM_COLUMNS}
        FROM streams AS st
        INNER JOIN stream_categories AS st_cat ON st.category_id = st_cat.id
        WHERE st.status = 'Active' AND st_cat.status = 'Active' AND st.category_id = $1
        ORDER BY st.name ASC
        "#
    );

    sqlx::query_as::<_, StreamRow>(&sql)
        .bind(category_id)
        .fetch_all(pool)
        .await
}

/// Look up a stream by its upstream-assigned id
pub async fn find_by_stream_id(
    pool: &PgPool,
    stream_id: i64,
) -> Result<Option<StreamRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {STREAM_COLUMNS}
        FROM streams AS st
        WHERE st.stream_id = $1
        "#
    );

    sqlx::query_as::<_, StreamRow>(&sql)
        .bind(stream_id)
        .fetch_optional(pool)
        .await
}

/// Insert a freshly discovered stream
pub async fn insert(pool: &PgPool, stream: &NewStream) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO streams (num, name, stream_type, stream_id, stream_icon,
            epg_channel_id, added, is_adult, category_id, category_ids,
            custom_sid, tv_archive, direct_source, tv_archive_duration)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(stream.num)
    .bind(&stream.name)
    .bind(&stream.stream_type)
    .bind(stream.stream_id)
    .bind(&stream.stream_icon)
    .bind(&stream.epg_channel_id)
    .bind(&stream.added)
    .bind(stream.is_adult)
    .bind(stream.category_id)
    .bind(&stream.category_ids)
    .bind(&stream.custom_sid)
    .bind(stream.tv_archive)
    .bind(&stream.direct_source)
    .bind(stream.tv_archive_duration)
    .execute(pool)
    .await?;

    Ok(())
}

/// Refresh every mutable field of a known stream, keyed by stream_id
pub async fn update(pool: &PgPool, stream: &NewStream) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE streams SET
            num = $2,
            name = $3,
            stream_type = $4,
            stream_icon = $5,
            epg_channel_id = $6,
            added = $7,
            is_adult = $8,
            category_id = $9,
            category_ids = $10,
            custom_sid = $11,
            tv_archive = $12,
            direct_source = $13,
            tv_archive_duration = $14
        WHERE stream_id = $1
        "#,
    )
    .bind(stream.stream_id)
    .bind(stream.num)
    .bind(&stream.name)
    .bind(&stream.stream_type)
    .bind(&stream.stream_icon)
    .bind(&stream.epg_channel_id)
    .bind(&stream.added)
    .bind(stream.is_adult)
    .bind(stream.category_id)
    .bind(&stream.category_ids)
    .bind(&stream.custom_sid)
    .bind(stream.tv_archive)
    .bind(&stream.direct_source)
    .bind(stream.tv_archive_duration)
    .execute(pool)
    .await?;

    Ok(())
}
