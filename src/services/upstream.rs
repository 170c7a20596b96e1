//! Upstream mirror pool
//!
//! The panel is reachable through interchangeable mirror base URLs kept in
//! the server_dns table. `pick_one` serves the request path (one random
//! active mirror); `candidates` serves failover callers, which walk the
//! ordered list until a mirror answers.

use sqlx::PgPool;
use tracing::warn;

/// Last-resort mirror when the pool is empty or the store is unreachable
const DEFAULT_UPSTREAM_URL: &str = "http://m3u.star4k.me";

/// Failover callers attempt at most this many candidates per operation
pub const MAX_UPSTREAM_ATTEMPTS: usize = 5;

#[derive(Debug, Clone)]
pub struct UpstreamPool {
    pool: PgPool,
}

impl UpstreamPool {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One mirror chosen uniformly at random from the active pool
    pub async fn pick_one(&self) -> String {
        let urls = match self.stored_urls().await {
            Ok(urls) => urls,
            Err(e) => {
                warn!("mirror pool unavailable, using default upstream: {}", e);
                return DEFAULT_UPSTREAM_URL.to_string();
            }
        };

        if urls.is_empty() {
            return DEFAULT_UPSTREAM_URL.to_string();
        }
        urls[fastrand::usize(..urls.len())].clone()
    }

    /// Ordered candidate list for failover: the caller's override list
    /// when present (bypasses the store), otherwise every active mirror;
    /// each http:// entry is followed by its https:// variant and the
    /// result deduplicated in first-seen order.
    pub async fn candidates(&self, override_urls: Option<&str>) -> Vec<String> {
        let urls = match override_urls {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => match self.stored_urls().await {
                Ok(urls) => urls,
                Err(e) => {
                    warn!("mirror pool unavailable, using default upstream: {}", e);
                    vec![DEFAULT_UPSTREAM_URL.to_string()]
                }
            },
        };

        let expanded = expand_candidates(urls);
        if expanded.is_empty() {
            vec![DEFAULT_UPSTREAM_URL.to_string()]
        } else {
            expanded
        }
    }

    async fn stored_urls(&self) -> Result<Vec<String>, sqlx::Error> {
        crate::db::repository::dns::active_urls(&self.pool).await
    }
}

/// Append the https:// variant directly after each http:// entry, then
/// deduplicate preserving the order of first appearance. Mirrors that
/// migrated to TLS keep answering on the upgraded scheme after the plain
/// one goes dark.
fn expand_candidates(urls: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(urls.len() * 2);

    for url in urls {
        push_unique(&mut out, url.clone());
        if let Some(rest) = url.strip_prefix("http://") {
            push_unique(&mut out, format!("https://{}", rest));
        }
    }

    out
}

fn push_unique(out: &mut Vec<String>, url: String) {
    if !out.contains(&url) {
        out.push(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_http_entries_get_https_variant_immediately_after() {
        let expanded = expand_candidates(owned(&["http://a.example", "http://b.example"]));
        assert_eq!(
            expanded,
            owned(&[
                "http://a.example",
                "https://a.example",
                "http://b.example",
                "https://b.example",
            ])
        );
    }

    #[test]
    fn test_https_entries_pass_through() {
        let expanded = expand_candidates(owned(&["https://a.example"]));
        assert_eq!(expanded, owned(&["https://a.example"]));
    }

    #[test]
    fn test_dedup_preserves_first_seen_order() {
        let expanded = expand_candidates(owned(&[
            "http://a.example",
            "https://a.example",
            "http://a.example",
            "http://b.example",
        ]));
        assert_eq!(
            expanded,
            owned(&[
                "http://a.example",
                "https://a.example",
                "http://b.example",
                "https://b.example",
            ])
        );
    }

    #[test]
    fn test_empty_pool_expands_to_nothing() {
        assert!(expand_candidates(Vec::new()).is_empty());
    }
}
