//! Catch-all redirect endpoint
//!
//! Anything not handled elsewhere (stream URLs, EPG fetches, panel pages)
//! is rewritten onto an upstream mirror and answered as a redirect. This
//! is a favorite target for scanners, so it has its own rate-limit class.

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::services::rate_limit::{client_identity, RateClass};
use crate::services::redirect::{build_raw_redirect, redact_url};
use crate::AppState;

/// Fallback handler: redirect the original path and query upstream
pub async fn redirect_any(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    let identity = client_identity(&headers, peer, state.config.trust_proxy_headers);
    if !state.limiter.allow(&identity, RateClass::Redirect) {
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({ "error": "rate_limited" })),
        ));
    }

    let base = state.upstream.pick_one().await;
    let url = build_raw_redirect(&base, uri.path(), uri.query());

    info!("redirecting to {}", redact_url(&url));

    Ok(Redirect::temporary(&url).into_response())
}
