use std::env;

/// Default User-Agent sent to the upstream panel. Some panels block
/// unknown clients, so this mimics a mobile browser.
const DEFAULT_UPSTREAM_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 11) AppleWebKit/537.36 \
     (KHTML, like Gecko) Version/4.0 Chrome/120.0 Mobile Safari/537.36";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    /// Advertised address for server_info rewriting. When set, the
    /// gateway's own address replaces whatever the upstream reports.
    pub server_ip: Option<String>,

    // PostgreSQL
    pub database_url: String,
    pub db_max_connections: u32,

    // Upstream panel
    pub upstream_timeout_secs: u64,
    pub upstream_user_agent: String,
    /// Comma-separated candidate list that bypasses the server_dns table.
    pub dns_urls_override: Option<String>,

    // Rate limiting (0 = unlimited)
    pub rate_limit_player_api_per_minute: u32,
    pub rate_limit_redirect_per_minute: u32,
    pub trust_proxy_headers: bool,

    // Catalog sync
    pub sync_enabled: bool,
    pub sync_interval_secs: u64,
    pub sync_username: Option<String>,
    pub sync_password: Option<String>,
    pub enable_m3u_fallback: bool,
    pub protected_category_ids: Vec<i32>,
    pub fallback_category_id: i32,
    pub header_marker_pattern: String,

    // Misc
    pub xmltv_path: String,
    pub debug: bool,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            server_ip: env::var("SERVER_IP").ok().filter(|s| !s.is_empty()),

            // PostgreSQL
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/xtream_gateway".to_string()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),

            // Upstream panel
            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .unwrap_or(20),
            upstream_user_agent: env::var("UPSTREAM_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_USER_AGENT.to_string()),
            dns_urls_override: env::var("DNS_URLS_OVERRIDE").ok().filter(|s| !s.is_empty()),

            // Rate limiting
            rate_limit_player_api_per_minute: env::var("RATE_LIMIT_PLAYER_API_PER_MINUTE")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            rate_limit_redirect_per_minute: env::var("RATE_LIMIT_REDIRECT_PER_MINUTE")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap_or(120),
            trust_proxy_headers: env_bool("TRUST_PROXY_HEADERS", false),

            // Catalog sync
            sync_enabled: env_bool("SYNC_ENABLED", true),
            sync_interval_secs: env::var("SYNC_INTERVAL_SECS")
                .unwrap_or_else(|_| "21600".to_string())
                .parse()
                .unwrap_or(21_600), // 6 hours
            sync_username: env::var("SYNC_USERNAME").ok().filter(|s| !s.is_empty()),
            sync_password: env::var("SYNC_PASSWORD").ok().filter(|s| !s.is_empty()),
            enable_m3u_fallback: env_bool("ENABLE_M3U_FALLBACK", false),
            protected_category_ids: env::var("PROTECTED_CATEGORY_IDS")
                .map(|raw| parse_id_list(&raw))
                .unwrap_or_default(),
            fallback_category_id: env::var("FALLBACK_CATEGORY_ID")
                .unwrap_or_else(|_| "1153".to_string())
                .parse()
                .unwrap_or(1153),
            header_marker_pattern: env::var("HEADER_MARKER_PATTERN")
                .unwrap_or_else(|_| "^#+.*#+$".to_string()),

            // Misc
            xmltv_path: env::var("XMLTV_PATH").unwrap_or_else(|_| "xml/guide.xml".to_string()),
            debug: env_bool("DEBUG", false),
        }
    }
}

/// Parse a boolean flag from the environment, accepting the usual spellings
fn env_bool(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "t" | "yes" | "y" | "on"
        ),
        Err(_) => default,
    }
}

/// Parse a comma-separated list of numeric ids, ignoring blanks and junk
fn parse_id_list(raw: &str) -> Vec<i32> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("1, 2,33"), vec![1, 2, 33]);
        assert_eq!(parse_id_list(""), Vec::<i32>::new());
        assert_eq!(parse_id_list("7,,x,9"), vec![7, 9]);
    }
}
