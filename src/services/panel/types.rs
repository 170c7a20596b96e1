//! Upstream panel payload types
//!
//! Lenient mappings of player-API responses. Numeric fields accept numbers
//! or numeric strings; unknown user_info fields are preserved through a
//! flattened map so the cached document matches what the panel sent.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Credentials for one panel account
#[derive(Debug, Clone)]
pub struct PanelCredentials {
    pub username: String,
    pub password: String,
}

/// Authentication response from player_api.php (no action)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelAuthResponse {
    #[serde(default)]
    pub user_info: Option<PanelUserInfo>,
    #[serde(default)]
    pub server_info: Option<Value>,
}

/// Account information, validated field by field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelUserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_date: Option<Value>,
    /// Everything else the panel reports, kept verbatim for the cache.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl PanelUserInfo {
    /// Panel granted access (auth flag equals 1)
    pub fn is_authorized(&self) -> bool {
        self.auth.as_ref().and_then(value_to_i64) == Some(1)
    }

    /// Account status is Active, or absent (older panels omit it)
    pub fn is_active(&self) -> bool {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(status) => status.eq_ignore_ascii_case("active"),
        }
    }

    /// Expiry timestamp exists, is non-zero, and has passed.
    /// Empty, zero, and non-numeric values never expire an account.
    pub fn is_expired(&self, now: i64) -> bool {
        match self.exp_date.as_ref().and_then(value_to_i64) {
            Some(exp) if exp != 0 => exp <= now,
            _ => false,
        }
    }

    /// Full admission check used by authentication caching
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.is_authorized() && self.is_active() && !self.is_expired(now)
    }
}

/// Category entry from get_live_categories
#[derive(Debug, Clone, Deserialize)]
pub struct PanelCategory {
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category_name: String,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub parent_id: Option<i64>,
}

/// Live stream entry from get_live_streams
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PanelStream {
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub num: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stream_type: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub stream_id: Option<i64>,
    #[serde(default)]
    pub stream_icon: Option<String>,
    #[serde(default)]
    pub epg_channel_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub added: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub is_adult: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category_ids: Option<Value>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub custom_sid: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub tv_archive: Option<i64>,
    #[serde(default)]
    pub direct_source: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub tv_archive_duration: Option<i64>,
}

/// Coerce a JSON value into an integer when it plausibly is one
pub fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn de_opt_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_i64))
}

fn de_opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_info(auth: Value, status: Option<&str>, exp_date: Option<Value>) -> PanelUserInfo {
        PanelUserInfo {
            auth: Some(auth),
            status: status.map(str::to_string),
            exp_date,
            extra: serde_json::Map::new(),
        }
    }

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_expired_timestamp_rejected() {
        let info = user_info(json!(1), Some("Active"), Some(json!(NOW - 1)));
        assert!(!info.is_valid_at(NOW));

        let info = user_info(json!("1"), Some("Active"), Some(json!((NOW - 1).to_string())));
        assert!(!info.is_valid_at(NOW));
    }

    #[test]
    fn test_missing_empty_or_zero_exp_date_accepted() {
        for exp in [None, Some(json!("")), Some(json!("0")), Some(json!(0))] {
            let info = user_info(json!(1), Some("Active"), exp);
            assert!(info.is_valid_at(NOW));
        }
    }

    #[test]
    fn test_future_exp_date_accepted() {
        let info = user_info(json!(1), None, Some(json!(NOW + 3600)));
        assert!(info.is_valid_at(NOW));
    }

    #[test]
    fn test_auth_flag_required() {
        let info = user_info(json!(0), Some("Active"), None);
        assert!(!info.is_valid_at(NOW));

        let missing = PanelUserInfo::default();
        assert!(!missing.is_valid_at(NOW));
    }

    #[test]
    fn test_status_case_insensitive() {
        assert!(user_info(json!(1), Some("ACTIVE"), None).is_valid_at(NOW));
        assert!(user_info(json!(1), Some("active"), None).is_valid_at(NOW));
        assert!(!user_info(json!(1), Some("Banned"), None).is_valid_at(NOW));
    }

    #[test]
    fn test_user_info_round_trips_extra_fields() {
        let raw = json!({
            "auth": 1,
            "status": "Active",
            "exp_date": "1893456000",
            "max_connections": "2",
            "is_trial": "0"
        });
        let info: PanelUserInfo = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(info.extra.get("max_connections"), Some(&json!("2")));
        assert_eq!(serde_json::to_value(&info).unwrap(), raw);
    }

    #[test]
    fn test_stream_numeric_fields_accept_strings() {
        let raw = json!({
            "num": "7",
            "name": "Canal Uno",
            "stream_id": "482",
            "category_id": 12,
            "is_adult": "0",
            "tv_archive": 1
        });
        let stream: PanelStream = serde_json::from_value(raw).unwrap();
        assert_eq!(stream.num, Some(7));
        assert_eq!(stream.stream_id, Some(482));
        assert_eq!(stream.category_id, Some(12));
        assert_eq!(stream.is_adult, Some(0));
        assert_eq!(stream.tv_archive, Some(1));
    }
}
