//! Structured player-API endpoint
//!
//! GET /player_api.php — the endpoint Xtream players talk to. Credentials
//! are enforced on every call. Category and live-stream listings are
//! served from the local catalog; every other action is redirected to an
//! upstream mirror with the caller's credentials passed through.

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::db::repository::{streams, users};
use crate::services::rate_limit::{client_identity, RateClass};
use crate::services::redirect::{build_passthrough, redact_url};
use crate::AppState;

#[derive(Deserialize, Default)]
pub struct PlayerApiQuery {
    pub username: Option<String>,
    pub password: Option<String>,
    pub action: Option<String>,
    pub category_id: Option<String>,
    pub vod_id: Option<String>,
    pub series_id: Option<String>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn error_response(status: StatusCode, code: &str) -> ApiError {
    (status, Json(serde_json::json!({ "error": code })))
}

fn internal_error(e: sqlx::Error) -> ApiError {
    tracing::error!("database error: {}", e);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
}

/// GET /player_api.php
pub async fn player_api(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<PlayerApiQuery>,
) -> Result<Response, ApiError> {
    let identity = client_identity(&headers, peer, state.config.trust_proxy_headers);
    if !state.limiter.allow(&identity, RateClass::PlayerApi) {
        return Err(error_response(StatusCode::TOO_MANY_REQUESTS, "rate_limited"));
    }

    let (Some(username), Some(password)) = (query.username.as_deref(), query.password.as_deref())
    else {
        return Err(error_response(StatusCode::BAD_REQUEST, "missing_credentials"));
    };
    if username.is_empty() || password.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "missing_credentials"));
    }

    let authenticated = state
        .auth
        .verify(username, password)
        .await
        .map_err(internal_error)?;
    if !authenticated {
        return Err(error_response(StatusCode::UNAUTHORIZED, "authentication_failed"));
    }

    let Some(action) = query.action.as_deref().filter(|a| !a.is_empty()) else {
        return account_info(&state, username, password).await;
    };

    match action {
        "get_live_categories" => {
            let rows = crate::db::repository::categories::list_active(&state.pool)
                .await
                .map_err(internal_error)?;
            Ok(Json(rows).into_response())
        }
        "get_live_streams" => {
            let rows = match query.category_id.as_deref() {
                None | Some("") => streams::list_active(&state.pool).await,
                Some(raw) => match raw.parse() {
                    Ok(category_id) => streams::list_by_category(&state.pool, category_id).await,
                    // An id that is not a number cannot match any category.
                    Err(_) => Ok(Vec::new()),
                },
            }
            .map_err(internal_error)?;
            Ok(Json(rows).into_response())
        }
        other => passthrough(&state, username, password, other, &query).await,
    }
}

/// No action: answer the cached user_info/server_info document
async fn account_info(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<Response, ApiError> {
    let user = users::find_active(&state.pool, username, password)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "authentication_failed"))?;

    let info = state
        .auth
        .account_info(&user)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "authentication_failed"))?;

    Ok(Json(info).into_response())
}

/// Actions the gateway does not serve locally are redirected upstream
/// with the caller's credentials attached.
async fn passthrough(
    state: &AppState,
    username: &str,
    password: &str,
    action: &str,
    query: &PlayerApiQuery,
) -> Result<Response, ApiError> {
    let base = state.upstream.pick_one().await;
    let url = build_passthrough(
        &base,
        username,
        password,
        action,
        query.series_id.as_deref(),
        query.vod_id.as_deref(),
    );

    info!("passing through action {} to {}", action, redact_url(&url));

    Ok(Redirect::temporary(&url).into_response())
}
