//! Outbound redirect URL construction and credential redaction
//!
//! Query parameters carry the upstream account's live credentials, so any
//! URL headed for a log sink must pass through `redact_url` first. That is
//! a hard requirement, not cosmetics.

use url::Url;

/// Placeholder substituted for redacted query values
const REDACTED: &str = "***";

/// Build a player_api.php pass-through URL. Exactly one of series_id /
/// vod_id is appended when supplied; series_id wins when both arrive.
pub fn build_passthrough(
    base: &str,
    username: &str,
    password: &str,
    action: &str,
    series_id: Option<&str>,
    vod_id: Option<&str>,
) -> String {
    let mut url = format!(
        "{}/player_api.php?username={}&password={}&action={}",
        base.trim_end_matches('/'),
        urlencoding::encode(username),
        urlencoding::encode(password),
        urlencoding::encode(action),
    );

    if let Some(series_id) = series_id {
        url.push_str(&format!("&series_id={}", urlencoding::encode(series_id)));
    } else if let Some(vod_id) = vod_id {
        url.push_str(&format!("&vod_id={}", urlencoding::encode(vod_id)));
    }

    url
}

/// Rewrite an arbitrary inbound path onto an upstream base, keeping the
/// original query string verbatim.
pub fn build_raw_redirect(base: &str, path: &str, query: Option<&str>) -> String {
    let mut url = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );

    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }

    url
}

/// Replace username/password query values with a placeholder. URLs that
/// refuse to parse collapse to "<redacted>" rather than risk leaking.
pub fn redact_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return "<redacted>".to_string();
    };

    if parsed.query().is_none() {
        return url.to_string();
    }

    let redacted: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let value = if k.eq_ignore_ascii_case("username") || k.eq_ignore_ascii_case("password")
            {
                REDACTED.to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();

    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(redacted.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_basic() {
        let url = build_passthrough("http://up.example", "u1", "p1", "get_series", None, None);
        assert_eq!(
            url,
            "http://up.example/player_api.php?username=u1&password=p1&action=get_series"
        );
    }

    #[test]
    fn test_passthrough_series_id_wins_over_vod_id() {
        let url = build_passthrough(
            "http://up.example/",
            "u1",
            "p1",
            "get_series_info",
            Some("42"),
            Some("99"),
        );
        assert!(url.ends_with("action=get_series_info&series_id=42"));
        assert!(!url.contains("vod_id"));
    }

    #[test]
    fn test_passthrough_vod_id_when_no_series_id() {
        let url = build_passthrough(
            "http://up.example",
            "u1",
            "p1",
            "get_vod_info",
            None,
            Some("99"),
        );
        assert!(url.ends_with("&vod_id=99"));
    }

    #[test]
    fn test_raw_redirect_preserves_query_verbatim() {
        let url = build_raw_redirect(
            "http://up.example",
            "live/u1/p1/482.ts",
            Some("token=a%20b&x=1"),
        );
        assert_eq!(url, "http://up.example/live/u1/p1/482.ts?token=a%20b&x=1");
    }

    #[test]
    fn test_raw_redirect_without_query() {
        let url = build_raw_redirect("http://up.example/", "/xmltv.php", None);
        assert_eq!(url, "http://up.example/xmltv.php");
    }

    #[test]
    fn test_redaction_masks_credentials_only() {
        let redacted =
            redact_url("http://up.example/player_api.php?username=u1&password=p1&action=x");
        assert!(!redacted.contains("u1"));
        assert!(!redacted.contains("p1"));
        assert!(redacted.contains("username=***"));
        assert!(redacted.contains("password=***"));
        assert!(redacted.contains("action=x"));
    }

    #[test]
    fn test_redaction_leaves_credential_free_urls_alone() {
        assert_eq!(
            redact_url("http://up.example/live/482.ts"),
            "http://up.example/live/482.ts"
        );
    }

    #[test]
    fn test_redaction_never_leaks_unparseable_input() {
        assert_eq!(redact_url("not a url at all"), "<redacted>");
    }
}
