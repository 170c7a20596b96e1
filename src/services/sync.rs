//! Catalog synchronization
//!
//! Pulls the upstream panel's live categories and streams and reconciles
//! them into the local catalog tables. Runs as a schedule-driven batch
//! task, failing over across mirror candidates and optionally falling
//! back to the M3U playlist when the structured API is unreachable.
//!
//! Reconciliation rules:
//! - categories keep their upstream id; display order is gateway-assigned
//!   and never reused
//! - streams are keyed by stream_id; rows whose current category is on the
//!   protected list are preserved untouched
//! - upstream category ids unknown locally collapse to the configured
//!   sentinel category
//! - rows are never deleted; removal upstream leaves stale local rows

use regex::Regex;
use sqlx::PgPool;
use std::collections::HashSet;
use thiserror::Error;
use tokio::time;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::models::NewStream;
use crate::db::repository::{categories, streams};
use crate::services::m3u_fallback;
use crate::services::panel::{PanelCategory, PanelClient, PanelCredentials, PanelStream};
use crate::services::sanitizer::NameSanitizer;
use crate::services::upstream::{UpstreamPool, MAX_UPSTREAM_ATTEMPTS};

/// Placeholder categories the panel ships that the gateway never exposes
const CATEGORY_DENYLIST: &[&str] = &[
    "LA| GENERAL",
    "LA| MEXICO",
    "LA| COLOMBIA",
    "LA| ARGENTINA",
    "LA| COSTA RICA",
    "LA| ECUADOR",
    "LA| ECUADOR DAZN PPV",
    "LA| GUATEMALA",
    "LA| HONDURAS",
    "LA| NICARAGUA",
    "LA| PERU",
    "LA| CHILE",
    "LA| PANAMA",
    "LA| R.DOMINICANA",
    "LA| URUGUAY",
    "LA| VENEZULA",
    "VE| VENEZUELA",
    "LA| EL SALVADOR",
];

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no upstream candidate answered")]
    UpstreamUnavailable,
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Outcome of one category reconciliation run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CategorySyncOutcome {
    pub inserted: usize,
    pub updated: usize,
}

/// Outcome of one stream reconciliation run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StreamSyncOutcome {
    pub inserted: usize,
    pub updated: usize,
    /// Rows left untouched because their category is protected.
    pub preserved: usize,
}

pub struct SyncService {
    pool: PgPool,
    upstream: UpstreamPool,
    client: PanelClient,
    sanitizer: NameSanitizer,
    protected_categories: HashSet<i32>,
    fallback_category_id: i32,
    header_marker: Regex,
    enable_m3u_fallback: bool,
    dns_urls_override: Option<String>,
}

impl SyncService {
    pub fn new(
        pool: PgPool,
        upstream: UpstreamPool,
        client: PanelClient,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let header_marker = Regex::new(&config.header_marker_pattern)
            .map_err(|e| anyhow::anyhow!("invalid HEADER_MARKER_PATTERN: {}", e))?;

        Ok(Self {
            pool,
            upstream,
            client,
            sanitizer: NameSanitizer::new(),
            protected_categories: config.protected_category_ids.iter().copied().collect(),
            fallback_category_id: config.fallback_category_id,
            header_marker,
            enable_m3u_fallback: config.enable_m3u_fallback,
            dns_urls_override: config.dns_urls_override.clone(),
        })
    }

    /// Reconcile upstream live categories into the local store.
    /// Idempotent; safe to run on a schedule.
    pub async fn sync_categories(
        &self,
        creds: &PanelCredentials,
    ) -> Result<CategorySyncOutcome, SyncError> {
        let fetched = self.fetch_categories(creds).await?;
        let kept = remove_denylisted(fetched);

        let mut outcome = CategorySyncOutcome::default();
        let mut next_order = categories::max_order(&self.pool).await?;

        for category in kept {
            let Some(id) = category.category_id.and_then(to_i32) else {
                warn!("skipping category with unusable id: {:?}", category.category_name);
                continue;
            };
            let name = category.category_name.trim();
            if name.is_empty() {
                continue;
            }

            let result = match categories::find_by_id(&self.pool, id).await? {
                Some(existing) => {
                    if existing.category_name == name {
                        continue;
                    }
                    outcome.updated += 1;
                    categories::update_name(&self.pool, id, name).await
                }
                None => {
                    next_order += 1;
                    let parent_id = category.parent_id.and_then(to_i32).unwrap_or(0);
                    outcome.inserted += 1;
                    categories::insert(&self.pool, id, name, parent_id, next_order).await
                }
            };

            // Abort the run rather than write a half-reconciled catalog.
            if let Err(e) = result {
                error!("store write failed for category id {}: {}", id, e);
                return Err(e.into());
            }
        }

        Ok(outcome)
    }

    /// Reconcile upstream live streams into the local store, keyed by
    /// stream_id. Idempotent; safe to run on a schedule.
    pub async fn sync_streams(
        &self,
        creds: &PanelCredentials,
    ) -> Result<StreamSyncOutcome, SyncError> {
        let fetched = self.fetch_streams(creds).await?;

        let mut outcome = StreamSyncOutcome::default();

        for stream in fetched {
            let Some(stream_id) = stream.stream_id else {
                warn!("skipping stream with no stream_id: {:?}", stream.name);
                continue;
            };
            if is_separator_row(&stream.name, &self.header_marker) {
                continue;
            }

            let existing = streams::find_by_stream_id(&self.pool, stream_id).await?;

            // Manually curated rows are never overwritten by upstream
            // re-categorization.
            if let Some(existing) = &existing {
                if existing
                    .category_id
                    .is_some_and(|c| self.protected_categories.contains(&c))
                {
                    outcome.preserved += 1;
                    continue;
                }
            }

            let category_id = self.resolve_category(stream.category_id).await?;
            let record = self.to_new_stream(&stream, stream_id, category_id);

            let result = if existing.is_some() {
                outcome.updated += 1;
                streams::update(&self.pool, &record).await
            } else {
                outcome.inserted += 1;
                streams::insert(&self.pool, &record).await
            };

            // Abort the run rather than write a half-reconciled catalog.
            if let Err(e) = result {
                error!("store write failed for stream_id {}: {}", stream_id, e);
                return Err(e.into());
            }
        }

        Ok(outcome)
    }

    /// Upstream category ids the local store has never seen collapse to
    /// the sentinel category.
    async fn resolve_category(&self, upstream: Option<i64>) -> Result<i32, sqlx::Error> {
        let Some(id) = upstream.and_then(to_i32) else {
            return Ok(self.fallback_category_id);
        };

        Ok(match categories::find_by_id(&self.pool, id).await? {
            Some(_) => id,
            None => self.fallback_category_id,
        })
    }

    fn to_new_stream(&self, stream: &PanelStream, stream_id: i64, category_id: i32) -> NewStream {
        NewStream {
            num: stream.num.and_then(to_i32),
            name: self.sanitizer.clean(&stream.name),
            stream_type: stream.stream_type.clone(),
            stream_id,
            stream_icon: stream.stream_icon.clone(),
            epg_channel_id: stream.epg_channel_id.clone(),
            added: stream.added.clone(),
            is_adult: stream.is_adult.and_then(to_i32).unwrap_or(0),
            category_id,
            category_ids: stream.category_ids.clone(),
            custom_sid: stream.custom_sid.clone(),
            tv_archive: stream.tv_archive.and_then(to_i32).unwrap_or(0),
            direct_source: stream.direct_source.clone(),
            tv_archive_duration: stream.tv_archive_duration.and_then(to_i32),
        }
    }

    /// Fetch live categories, walking the candidate list until a mirror
    /// answers, then falling back to the playlist when enabled.
    async fn fetch_categories(
        &self,
        creds: &PanelCredentials,
    ) -> Result<Vec<PanelCategory>, SyncError> {
        let candidates = self
            .upstream
            .candidates(self.dns_urls_override.as_deref())
            .await;

        for base in candidates.iter().take(MAX_UPSTREAM_ATTEMPTS) {
            match self.client.get_live_categories(base, creds).await {
                Ok(categories) => return Ok(categories),
                Err(e) => warn!("category fetch failed on one mirror: {}", e),
            }
        }

        if self.enable_m3u_fallback {
            info!("structured API unreachable, recovering categories from playlist");
            let text = self.fetch_playlist(creds, &candidates).await?;
            return Ok(m3u_fallback::parse_categories(&text));
        }

        Err(SyncError::UpstreamUnavailable)
    }

    /// Fetch live streams with the same failover/fallback policy
    async fn fetch_streams(&self, creds: &PanelCredentials) -> Result<Vec<PanelStream>, SyncError> {
        let candidates = self
            .upstream
            .candidates(self.dns_urls_override.as_deref())
            .await;

        for base in candidates.iter().take(MAX_UPSTREAM_ATTEMPTS) {
            match self.client.get_live_streams(base, creds).await {
                Ok(streams) => return Ok(streams),
                Err(e) => warn!("stream fetch failed on one mirror: {}", e),
            }
        }

        if self.enable_m3u_fallback {
            info!("structured API unreachable, recovering streams from playlist");
            let text = self.fetch_playlist(creds, &candidates).await?;
            let categories = m3u_fallback::parse_categories(&text);
            let table = m3u_fallback::category_name_to_id(&categories);
            return Ok(m3u_fallback::parse_streams(&text, &table));
        }

        Err(SyncError::UpstreamUnavailable)
    }

    async fn fetch_playlist(
        &self,
        creds: &PanelCredentials,
        candidates: &[String],
    ) -> Result<String, SyncError> {
        for base in candidates.iter().take(MAX_UPSTREAM_ATTEMPTS) {
            match self.client.get_playlist(base, creds).await {
                Ok(text) => return Ok(text),
                Err(e) => warn!("playlist fetch failed on one mirror: {}", e),
            }
        }

        Err(SyncError::UpstreamUnavailable)
    }
}

/// Drop the panel's placeholder categories before reconciling
fn remove_denylisted(categories: Vec<PanelCategory>) -> Vec<PanelCategory> {
    categories
        .into_iter()
        .filter(|c| !CATEGORY_DENYLIST.contains(&c.category_name.as_str()))
        .collect()
}

/// Separator rows are channel-list headers, not channels: empty names or
/// text wrapped in repeated # markers.
fn is_separator_row(name: &str, header_marker: &Regex) -> bool {
    let name = name.trim();
    name.is_empty() || header_marker.is_match(name)
}

fn to_i32(value: i64) -> Option<i32> {
    i32::try_from(value).ok()
}

/// Interval-driven sync loop, spawned at startup. Each cycle runs the
/// category pass then the stream pass with the configured panel account.
pub async fn start_sync_task(service: SyncService, interval_secs: u64, creds: PanelCredentials) {
    let mut interval = time::interval(time::Duration::from_secs(interval_secs.max(60)));

    loop {
        interval.tick().await;

        match service.sync_categories(&creds).await {
            Ok(outcome) => info!(
                "category sync done: {} inserted, {} updated",
                outcome.inserted, outcome.updated
            ),
            Err(e) => {
                error!("category sync aborted: {}", e);
                continue;
            }
        }

        match service.sync_streams(&creds).await {
            Ok(outcome) => info!(
                "stream sync done: {} inserted, {} updated, {} preserved",
                outcome.inserted, outcome.updated, outcome.preserved
            ),
            Err(e) => error!("stream sync aborted: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: i64, name: &str) -> PanelCategory {
        PanelCategory {
            category_id: Some(id),
            category_name: name.to_string(),
            parent_id: Some(0),
        }
    }

    #[test]
    fn test_denylisted_placeholder_categories_removed() {
        let kept = remove_denylisted(vec![
            category(1, "Deportes"),
            category(2, "LA| MEXICO"),
            category(3, "VE| VENEZUELA"),
            category(4, "Noticias"),
        ]);

        let names: Vec<&str> = kept.iter().map(|c| c.category_name.as_str()).collect();
        assert_eq!(names, vec!["Deportes", "Noticias"]);
    }

    #[test]
    fn test_separator_rows_detected() {
        let marker = Regex::new("^#+.*#+$").unwrap();

        assert!(is_separator_row("", &marker));
        assert!(is_separator_row("   ", &marker));
        assert!(is_separator_row("##### DEPORTES #####", &marker));
        assert!(!is_separator_row("ESPN HD", &marker));
        assert!(!is_separator_row("#1 Music", &marker));
    }
}
