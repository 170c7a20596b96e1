//! Per-client sliding-window rate limiting
//!
//! Best-effort, single-process admission control in front of the abusable
//! endpoints. One fixed 60-second window per (client identity, endpoint
//! class); the window map lives behind a single mutex and entries are
//! never evicted. For real protection put a reverse proxy in front.

use axum::http::HeaderMap;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);

/// Endpoint classes with independent limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateClass {
    /// player_api.php — abuse-sensitive, lower throughput
    PlayerApi,
    /// catch-all redirect — common scanner target, higher throughput
    Redirect,
}

/// Per-minute limits for each class; 0 disables the class entirely
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub player_api_per_minute: u32,
    pub redirect_per_minute: u32,
}

pub struct RateLimiter {
    limits: RateLimits,
    windows: Mutex<HashMap<(String, RateClass), (Instant, u32)>>,
}

impl RateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        Self {
            limits,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or reject one request. Rejections are terminal for the
    /// request; there is no queueing.
    pub fn allow(&self, identity: &str, class: RateClass) -> bool {
        self.allow_at(Instant::now(), identity, class)
    }

    fn allow_at(&self, now: Instant, identity: &str, class: RateClass) -> bool {
        let limit = match class {
            RateClass::PlayerApi => self.limits.player_api_per_minute,
            RateClass::Redirect => self.limits.redirect_per_minute,
        };
        if limit == 0 {
            return true;
        }

        let mut windows = self.windows.lock().expect("rate limiter lock poisoned");
        let entry = windows
            .entry((identity.to_string(), class))
            .or_insert((now, 0));

        if now.duration_since(entry.0) >= WINDOW {
            *entry = (now, 0);
        }
        entry.1 += 1;

        entry.1 <= limit
    }
}

/// Resolve the client identity for rate limiting: the first entry of the
/// X-Forwarded-For chain when the deployment explicitly trusts its proxy,
/// otherwise the raw peer address. The header is trivially spoofable, so
/// trusting it is opt-in.
pub fn client_identity(headers: &HeaderMap, peer: SocketAddr, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return forwarded.to_string();
        }
    }
    peer.ip().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(player_api: u32, redirect: u32) -> RateLimiter {
        RateLimiter::new(RateLimits {
            player_api_per_minute: player_api,
            redirect_per_minute: redirect,
        })
    }

    #[test]
    fn test_admits_up_to_limit_then_rejects() {
        let limiter = limiter(3, 0);
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.allow_at(now, "1.2.3.4", RateClass::PlayerApi));
        }
        assert!(!limiter.allow_at(now, "1.2.3.4", RateClass::PlayerApi));
    }

    #[test]
    fn test_window_resets_after_a_minute() {
        let limiter = limiter(1, 0);
        let start = Instant::now();

        assert!(limiter.allow_at(start, "1.2.3.4", RateClass::PlayerApi));
        assert!(!limiter.allow_at(start + Duration::from_secs(59), "1.2.3.4", RateClass::PlayerApi));
        assert!(limiter.allow_at(start + Duration::from_secs(60), "1.2.3.4", RateClass::PlayerApi));
    }

    #[test]
    fn test_identities_and_classes_are_independent() {
        let limiter = limiter(1, 1);
        let now = Instant::now();

        assert!(limiter.allow_at(now, "1.2.3.4", RateClass::PlayerApi));
        assert!(limiter.allow_at(now, "5.6.7.8", RateClass::PlayerApi));
        assert!(limiter.allow_at(now, "1.2.3.4", RateClass::Redirect));
        assert!(!limiter.allow_at(now, "1.2.3.4", RateClass::PlayerApi));
    }

    #[test]
    fn test_zero_limit_means_unlimited() {
        let limiter = limiter(0, 0);
        let now = Instant::now();

        for _ in 0..1000 {
            assert!(limiter.allow_at(now, "1.2.3.4", RateClass::PlayerApi));
        }
    }

    #[test]
    fn test_forwarded_identity_only_when_trusted() {
        let peer: SocketAddr = "10.0.0.1:9999".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());

        assert_eq!(client_identity(&headers, peer, false), "10.0.0.1");
        assert_eq!(client_identity(&headers, peer, true), "203.0.113.7");
        assert_eq!(client_identity(&HeaderMap::new(), peer, true), "10.0.0.1");
    }
}
