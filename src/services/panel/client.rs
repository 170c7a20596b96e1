//! Upstream panel HTTP client
//!
//! One shared reqwest client with the configured timeout and User-Agent.
//! Every call takes the mirror base URL as a parameter because failover
//! walks the candidate list; the client itself never picks a mirror.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONNECTION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{PanelAuthResponse, PanelCategory, PanelCredentials, PanelStream};

/// Panel call failure. Http and Parse both count as "this mirror is
/// unusable" for failover purposes.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("http status {0}")]
    Http(u16),
    #[error("parse error: {0}")]
    Parse(String),
}

/// HTTP client for the panel's player API and playlist download
#[derive(Debug, Clone)]
pub struct PanelClient {
    http: Client,
}

impl PanelClient {
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json,text/plain,*/*"),
        );
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self { http })
    }

    /// GET player_api.php on one mirror with the given query parameters
    async fn get_player_api<T: DeserializeOwned>(
        &self,
        base: &str,
        params: &[(&str, &str)],
    ) -> Result<T, PanelError> {
        let url = format!("{}/player_api.php", base.trim_end_matches('/'));
        let action = params
            .iter()
            .find(|(k, _)| *k == "action")
            .map(|(_, v)| *v)
            .unwrap_or("(user info)");

        debug!("panel request: action {}", action);

        let response = self.http.get(&url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PanelError::Http(status.as_u16()));
        }

        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            warn!("failed to parse panel response for action {}: {}", action, e);
            debug!("response text: {}", &text[..text.len().min(500)]);
            PanelError::Parse(e.to_string())
        })
    }

    /// Credentials check: player_api.php with no action returns
    /// user_info + server_info.
    pub async fn get_user_info(
        &self,
        base: &str,
        creds: &PanelCredentials,
    ) -> Result<PanelAuthResponse, PanelError> {
        self.get_player_api(
            base,
            &[("username", &creds.username), ("password", &creds.password)],
        )
        .await
    }

    /// Live category listing
    pub async fn get_live_categories(
        &self,
        base: &str,
        creds: &PanelCredentials,
    ) -> Result<Vec<PanelCategory>, PanelError> {
        self.get_player_api(
            base,
            &[
                ("username", &creds.username),
                ("password", &creds.password),
                ("action", "get_live_categories"),
            ],
        )
        .await
    }

    /// Live stream listing
    pub async fn get_live_streams(
        &self,
        base: &str,
        creds: &PanelCredentials,
    ) -> Result<Vec<PanelStream>, PanelError> {
        self.get_player_api(
            base,
            &[
                ("username", &creds.username),
                ("password", &creds.password),
                ("action", "get_live_streams"),
            ],
        )
        .await
    }

    /// Raw M3U playlist download (get.php), used by the fallback parser
    pub async fn get_playlist(
        &self,
        base: &str,
        creds: &PanelCredentials,
    ) -> Result<String, PanelError> {
        let url = format!("{}/get.php", base.trim_end_matches('/'));

        let response = self
            .http
            .get(&url)
            .query(&[
                ("username", creds.username.as_str()),
                ("password", creds.password.as_str()),
                ("type", "m3u_plus"),
                ("output", "ts"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PanelError::Http(status.as_u16()));
        }

        let text = response.text().await?;
        if !text.contains("#EXTM3U") && !text.contains("#EXTINF") {
            return Err(PanelError::Parse("response is not an M3U playlist".into()));
        }

        Ok(text)
    }
}
