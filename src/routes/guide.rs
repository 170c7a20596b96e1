//! Program guide document
//!
//! GET /xmltv.php — serves the locally maintained XMLTV guide so players
//! never hit the upstream for EPG data.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::warn;

use crate::AppState;

pub async fn xmltv(
    State(state): State<Arc<AppState>>,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    let path = &state.config.xmltv_path;

    let body = tokio::fs::read(path).await.map_err(|e| {
        warn!("guide document unavailable at {}: {}", path, e);
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "guide_unavailable" })),
        )
    })?;

    Ok(([(header::CONTENT_TYPE, "text/xml")], body).into_response())
}
