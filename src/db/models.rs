//! Database row types for PostgreSQL
//!
//! Row types map directly to table columns. Catalog rows also serialize
//! into the player-API JSON shape, so the same struct flows from the
//! repository straight into a response body.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

/// Cached panel account row
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub password: String,
}

/// Cached user_info/server_info documents for one account
#[derive(Debug, Clone, FromRow)]
pub struct UserServerInfoRow {
    pub id: i32,
    pub user_id: i32,
    pub user_info: Value,
    pub server_info: Value,
    pub updated_at: DateTime<Utc>,
}

/// Upstream mirror row from the server_dns pool
#[derive(Debug, Clone, FromRow)]
pub struct DnsEndpointRow {
    pub id: i32,
    pub dns_url: String,
    pub status: String,
}

/// Stream category row. The id is upstream-assigned; cat_order is ours.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CategoryRow {
    #[serde(rename = "category_id")]
    pub id: i32,
    pub category_name: String,
    pub parent_id: i32,
    #[serde(skip_serializing)]
    pub cat_order: i32,
    #[serde(skip_serializing)]
    pub status: String,
}

/// Live stream row, serialized in the player-API get_live_streams shape
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StreamRow {
    #[serde(skip_serializing)]
    pub id: i32,
    pub num: Option<i32>,
    pub name: String,
    pub stream_type: Option<String>,
    pub stream_id: i64,
    pub stream_icon: Option<String>,
    pub epg_channel_id: Option<String>,
    pub added: Option<String>,
    pub is_adult: i32,
    pub category_id: Option<i32>,
    pub category_ids: Option<Value>,
    pub custom_sid: Option<String>,
    pub tv_archive: i32,
    pub direct_source: Option<String>,
    pub tv_archive_duration: Option<i32>,
    #[serde(skip_serializing)]
    pub status: String,
}

/// New or refreshed stream for reconciliation writes
#[derive(Debug, Clone)]
pub struct NewStream {
    pub num: Option<i32>,
    pub name: String,
    pub stream_type: Option<String>,
    pub stream_id: i64,
    pub stream_icon: Option<String>,
    pub epg_channel_id: Option<String>,
    pub added: Option<String>,
    pub is_adult: i32,
    pub category_id: i32,
    pub category_ids: Option<Value>,
    pub custom_sid: Option<String>,
    pub tv_archive: i32,
    pub direct_source: Option<String>,
    pub tv_archive_duration: Option<i32>,
}
