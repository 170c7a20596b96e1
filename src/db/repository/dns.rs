//! Upstream mirror pool repository

use sqlx::PgPool;

use crate::db::models::DnsEndpointRow;

/// All active mirror rows, in insertion order
pub async fn list_active(pool: &PgPool) -> Result<Vec<DnsEndpointRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DnsEndpointRow>(
        r#"
        SELECT id, dns_url, status
        FROM server_dns
        WHERE status = 'Active'
        ORDER BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Active mirror base URLs, in insertion order, blanks dropped
pub async fn active_urls(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let rows = list_active(pool).await?;

    Ok(rows
        .into_iter()
        .map(|row| row.dns_url)
        .filter(|url| !url.is_empty())
        .collect())
}
