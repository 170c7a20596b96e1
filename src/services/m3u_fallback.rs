//! M3U playlist fallback parser
//!
//! When every structured-API candidate is down, an approximate catalog can
//! still be recovered from the panel's M3U playlist. Categories come from
//! the group-title attribute, streams from (EXTINF, URL) line pairs. The
//! output feeds catalog reconciliation exactly as a structured response
//! would; nothing here touches the store.
//!
//! Ids must be stable across repeated parses of the same input, so they
//! are derived from checksums of the name/URL rather than from counters
//! or clocks.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use sha1::{Digest, Sha1};
use std::collections::HashMap;

use super::panel::{PanelCategory, PanelStream};

lazy_static! {
    /// group-title="..." on an EXTINF line
    static ref GROUP_TITLE_REGEX: Regex = Regex::new(r#"group-title="([^"]*)""#).unwrap();
    /// tvg-logo="..." on an EXTINF line
    static ref TVG_LOGO_REGEX: Regex = Regex::new(r#"tvg-logo="([^"]*)""#).unwrap();
    /// tvg-id="..." on an EXTINF line
    static ref TVG_ID_REGEX: Regex = Regex::new(r#"tvg-id="([^"]*)""#).unwrap();
    /// trailing numeric media segment: /12345.ts or /12345.m3u8
    static ref STREAM_ID_REGEX: Regex = Regex::new(r"/(\d+)\.(?:ts|m3u8)(?:\?.*)?$").unwrap();
}

/// Deterministic 31-bit id from arbitrary text, never zero
fn checksum_id(text: &str) -> i64 {
    let digest = Sha1::digest(text.as_bytes());
    let word = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    let id = i64::from(word & 0x7FFF_FFFF);
    if id == 0 {
        1
    } else {
        id
    }
}

/// Derive categories from the distinct group-title values, first-seen
/// order, each with a checksum-derived id.
pub fn parse_categories(text: &str) -> Vec<PanelCategory> {
    let mut seen: HashMap<String, i64> = HashMap::new();
    let mut categories = Vec::new();

    for line in text.lines() {
        if !line.starts_with("#EXTINF:") {
            continue;
        }
        let Some(name) = GROUP_TITLE_REGEX
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
        else {
            continue;
        };
        if name.is_empty() || seen.contains_key(&name) {
            continue;
        }

        let id = checksum_id(&name);
        seen.insert(name.clone(), id);
        categories.push(PanelCategory {
            category_id: Some(id),
            category_name: name,
            parent_id: Some(0),
        });
    }

    categories
}

/// Build the group-title → category id table parse_streams expects
pub fn category_name_to_id(categories: &[PanelCategory]) -> HashMap<String, i64> {
    categories
        .iter()
        .filter_map(|c| c.category_id.map(|id| (c.category_name.clone(), id)))
        .collect()
}

/// Derive streams from consecutive (EXTINF metadata, URL) line pairs,
/// shaped like a structured get_live_streams response.
pub fn parse_streams(text: &str, categories: &HashMap<String, i64>) -> Vec<PanelStream> {
    let lines: Vec<&str> = text.lines().collect();
    let mut streams = Vec::new();
    let mut num: i64 = 1;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();
        if !line.starts_with("#EXTINF:") {
            i += 1;
            continue;
        }

        let url = lines.get(i + 1).map(|l| l.trim()).unwrap_or("");

        let name = match line.rsplit_once(',') {
            Some((_, title)) => title.trim().to_string(),
            None => "Unknown".to_string(),
        };

        let group = GROUP_TITLE_REGEX
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .unwrap_or("");
        let category_id = categories.get(group).copied().unwrap_or(0);

        let stream_icon = TVG_LOGO_REGEX
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty());
        let epg_channel_id = TVG_ID_REGEX
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty());

        let stream_id = STREAM_ID_REGEX
            .captures(url)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or_else(|| checksum_id(url));

        streams.push(PanelStream {
            num: Some(num),
            name,
            stream_type: Some("live".to_string()),
            stream_id: Some(stream_id),
            stream_icon,
            epg_channel_id,
            added: None,
            is_adult: Some(0),
            category_id: Some(category_id),
            category_ids: Some(json!([category_id])),
            custom_sid: None,
            tv_archive: Some(0),
            direct_source: Some(url.to_string()),
            tv_archive_duration: Some(0),
        });

        num += 1;
        i += 2;
    }

    streams
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYLIST: &str = "#EXTM3U\n\
        #EXTINF:-1 tvg-id=\"espn.mx\" tvg-logo=\"http://logo/espn.png\" group-title=\"Deportes\",CLARO| ESPN\n\
        http://host/live/u/p/482.ts\n\
        #EXTINF:-1 group-title=\"Noticias\",Canal Azul\n\
        http://host/live/u/p/strange-path\n\
        #EXTINF:-1 group-title=\"Deportes\",Fox Sports\n\
        http://host/live/u/p/483.m3u8\n";

    #[test]
    fn test_categories_deduped_in_first_seen_order() {
        let categories = parse_categories(PLAYLIST);
        let names: Vec<&str> = categories.iter().map(|c| c.category_name.as_str()).collect();
        assert_eq!(names, vec!["Deportes", "Noticias"]);
    }

    #[test]
    fn test_category_ids_deterministic_and_nonzero() {
        let first = parse_categories(PLAYLIST);
        let second = parse_categories(PLAYLIST);

        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.category_id, b.category_id);
            assert!(a.category_id.unwrap() > 0);
        }
    }

    #[test]
    fn test_stream_id_from_trailing_path_segment() {
        let categories = category_name_to_id(&parse_categories(PLAYLIST));
        let streams = parse_streams(PLAYLIST, &categories);

        assert_eq!(streams[0].stream_id, Some(482));
        assert_eq!(streams[2].stream_id, Some(483));
    }

    #[test]
    fn test_stream_id_falls_back_to_url_checksum() {
        let categories = category_name_to_id(&parse_categories(PLAYLIST));
        let streams = parse_streams(PLAYLIST, &categories);

        let fallback_id = streams[1].stream_id.unwrap();
        assert!(fallback_id > 0);
        assert_eq!(fallback_id, checksum_id("http://host/live/u/p/strange-path"));
    }

    #[test]
    fn test_streams_map_group_to_category_id() {
        let categories = parse_categories(PLAYLIST);
        let table = category_name_to_id(&categories);
        let streams = parse_streams(PLAYLIST, &table);

        let deportes = categories
            .iter()
            .find(|c| c.category_name == "Deportes")
            .unwrap()
            .category_id;
        assert_eq!(streams[0].category_id, deportes);
        assert_eq!(streams[2].category_id, deportes);
    }

    #[test]
    fn test_unmapped_group_gets_category_zero() {
        let streams = parse_streams(PLAYLIST, &HashMap::new());
        assert_eq!(streams[0].category_id, Some(0));
    }

    #[test]
    fn test_name_from_trailing_comma_field() {
        let categories = category_name_to_id(&parse_categories(PLAYLIST));
        let streams = parse_streams(PLAYLIST, &categories);

        assert_eq!(streams[0].name, "CLARO| ESPN");
        assert_eq!(streams[0].epg_channel_id.as_deref(), Some("espn.mx"));
        assert_eq!(streams[0].stream_icon.as_deref(), Some("http://logo/espn.png"));
    }

    #[test]
    fn test_checksum_id_never_zero() {
        assert!(checksum_id("") > 0);
        assert!(checksum_id("anything") > 0);
    }
}
