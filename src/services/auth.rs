//! Authentication verification and caching
//!
//! The first successful credentials check against the upstream panel is
//! cached as a users row plus the panel's user_info/server_info documents;
//! later requests authenticate against the local store without touching
//! the upstream. There is no TTL on the cached result — the only
//! re-validation happens when the per-user document row is missing.

use chrono::Utc;
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::models::UserRow;
use crate::db::repository::users;
use crate::services::panel::{PanelAuthResponse, PanelClient, PanelCredentials};
use crate::services::upstream::UpstreamPool;

pub struct AuthService {
    pool: PgPool,
    upstream: UpstreamPool,
    client: PanelClient,
    /// Gateway address advertised in server_info instead of the upstream's.
    server_ip: Option<String>,
    port: u16,
}

impl AuthService {
    pub fn new(pool: PgPool, upstream: UpstreamPool, client: PanelClient, config: &Config) -> Self {
        Self {
            pool,
            upstream,
            client,
            server_ip: config.server_ip.clone(),
            port: config.port,
        }
    }

    /// Verify credentials, preferring the local cache. A miss costs one
    /// credentials check against a single upstream mirror; upstream
    /// refusal, expiry, or unreachability all read as "not authenticated".
    pub async fn verify(&self, username: &str, password: &str) -> Result<bool, sqlx::Error> {
        if users::find_active(&self.pool, username, password)
            .await?
            .is_some()
        {
            return Ok(true);
        }

        let Some(auth) = self.check_upstream(username, password).await else {
            return Ok(false);
        };

        let user_id = users::insert_or_get(&self.pool, username, password).await?;
        self.store_documents(user_id, &auth).await?;
        info!("cached authentication for user id {}", user_id);

        Ok(true)
    }

    /// Cached {user_info, server_info} document for an account. A missing
    /// row triggers exactly one re-fetch from upstream; a second failure
    /// yields None and the caller answers authentication_failed.
    pub async fn account_info(&self, user: &UserRow) -> Result<Option<Value>, sqlx::Error> {
        if let Some(row) = users::get_server_info(&self.pool, user.id).await? {
            return Ok(Some(json!({
                "user_info": row.user_info,
                "server_info": row.server_info,
            })));
        }

        let Some(auth) = self.check_upstream(&user.username, &user.password).await else {
            return Ok(None);
        };

        self.store_documents(user.id, &auth).await?;
        Ok(Some(json!({
            "user_info": auth.user_info,
            "server_info": rewrite_server_info(
                auth.server_info.clone(),
                self.server_ip.as_deref(),
                self.port,
            ),
        })))
    }

    /// One credentials check against one mirror. Returns the payload only
    /// when the panel says the account is authorized, active and unexpired.
    async fn check_upstream(&self, username: &str, password: &str) -> Option<PanelAuthResponse> {
        let base = self.upstream.pick_one().await;
        let creds = PanelCredentials {
            username: username.to_string(),
            password: password.to_string(),
        };

        let auth = match self.client.get_user_info(&base, &creds).await {
            Ok(auth) => auth,
            Err(e) => {
                warn!("upstream credentials check failed: {}", e);
                return None;
            }
        };

        let valid = auth
            .user_info
            .as_ref()
            .is_some_and(|info| info.is_valid_at(Utc::now().timestamp()));
        if !valid {
            return None;
        }

        Some(auth)
    }

    async fn store_documents(
        &self,
        user_id: i32,
        auth: &PanelAuthResponse,
    ) -> Result<(), sqlx::Error> {
        let user_info = serde_json::to_value(&auth.user_info).unwrap_or(Value::Null);
        let server_info =
            rewrite_server_info(auth.server_info.clone(), self.server_ip.as_deref(), self.port);

        users::upsert_server_info(&self.pool, user_id, &user_info, &server_info).await
    }
}

/// The upstream reports its own address in server_info; players must come
/// back through the gateway instead, so the configured gateway address
/// wins when present.
fn rewrite_server_info(server_info: Option<Value>, server_ip: Option<&str>, port: u16) -> Value {
    let mut server_info = server_info.unwrap_or_else(|| json!({}));

    if let Some(obj) = server_info.as_object_mut() {
        if let Some(ip) = server_ip {
            obj.insert("url".to_string(), json!(ip));
            obj.insert("port".to_string(), json!(port.to_string()));
        }
    }

    server_info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_address_wins_when_configured() {
        let upstream = json!({"url": "panel.example", "port": "8000", "timezone": "UTC"});
        let rewritten = rewrite_server_info(Some(upstream), Some("gw.example"), 8080);

        assert_eq!(rewritten["url"], json!("gw.example"));
        assert_eq!(rewritten["port"], json!("8080"));
        assert_eq!(rewritten["timezone"], json!("UTC"));
    }

    #[test]
    fn test_upstream_address_kept_without_override() {
        let upstream = json!({"url": "panel.example", "port": "8000"});
        let rewritten = rewrite_server_info(Some(upstream.clone()), None, 8080);

        assert_eq!(rewritten, upstream);
    }

    #[test]
    fn test_missing_server_info_becomes_object() {
        let rewritten = rewrite_server_info(None, Some("gw.example"), 8080);
        assert_eq!(rewritten["url"], json!("gw.example"));
    }
}
