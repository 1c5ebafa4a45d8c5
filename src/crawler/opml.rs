//! OPML outline document parsing for the directory tree.
//!
//! A directory page is an OPML body whose `outline` elements are either
//! playable stations (`type="audio"`) or pointers to deeper category pages
//! (`type="link"`).

use roxmltree::Document;
use serde_json::Value;

use crate::error::Result;
use crate::models::{Placement, SourceId, StationRecord, parse_bitrate};
use crate::utils::{has_stream_marker, is_http_url};

/// A subcategory pointer found in an outline document.
#[derive(Debug, Clone)]
pub struct OutlineLink {
    pub url: String,
    pub text: String,
}

/// Parse result of one outline document.
#[derive(Debug, Default)]
pub struct ParsedOutline {
    pub stations: Vec<StationRecord>,
    pub links: Vec<OutlineLink>,
}

/// Subcategory names come from link labels; path separators and ampersands
/// are folded to underscores so they stay usable as group-key segments.
pub fn sanitize_segment(text: &str) -> String {
    text.replace([' ', '/', '&'], "_")
}

/// Parse one OPML page into stations and subcategory links.
pub fn parse_outline_document(xml: &str, category: &str, subcategory: &str) -> Result<ParsedOutline> {
    let trimmed = xml.trim_start_matches('\u{feff}').trim();
    let doc = Document::parse(trimmed)?;
    let mut parsed = ParsedOutline::default();

    for node in doc.descendants().filter(|n| n.has_tag_name("outline")) {
        match node.attribute("type") {
            Some("audio") => {
                if let Some(station) = station_from_outline(&node, category, subcategory, false) {
                    parsed.stations.push(station);
                }
            }
            Some("link") => {
                let url = node.attribute("URL").unwrap_or_default();
                if !url.is_empty() {
                    parsed.links.push(OutlineLink {
                        url: url.to_string(),
                        text: node.attribute("text").unwrap_or_default().to_string(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(parsed)
}

/// Build a station record from an `outline type="audio"` element.
///
/// Returns None when the element has no name or URL, or when the URL is
/// neither http(s) nor carries a known stream marker (unless `force`).
fn station_from_outline(
    node: &roxmltree::Node<'_, '_>,
    category: &str,
    subcategory: &str,
    force: bool,
) -> Option<StationRecord> {
    let name = node.attribute("text").unwrap_or_default();
    let url = node.attribute("URL").unwrap_or_default();
    if name.is_empty() || url.is_empty() {
        return None;
    }
    if !force && !is_http_url(url) && !has_stream_marker(url) {
        return None;
    }

    let subtext = node.attribute("subtext").unwrap_or_default();
    let codec = node
        .attribute("formats")
        .unwrap_or("mp3")
        .split(',')
        .next()
        .unwrap_or("mp3")
        .to_string();

    // Keep the raw element attributes around for diagnostics.
    let mut attributes = serde_json::Map::new();
    for attr in node.attributes() {
        attributes.insert(
            attr.name().to_string(),
            Value::String(attr.value().to_string()),
        );
    }

    Some(StationRecord {
        external_id: node.attribute("guide_id").unwrap_or_default().to_string(),
        name: name.to_string(),
        url: url.to_string(),
        homepage: String::new(),
        favicon: node.attribute("image").unwrap_or_default().to_string(),
        tags: vec![SourceId::Hierarchical.as_str().to_string(), category.to_string()],
        country: extract_country(name, subtext),
        language: extract_language(name, subtext),
        codec,
        bitrate: parse_bitrate(node.attribute("bitrate").unwrap_or_default()),
        source: SourceId::Hierarchical,
        source_type: "opml_api".to_string(),
        placement: Some(Placement {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
        }),
        attributes,
    })
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn has_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

/// Best-effort language guess from the station name and subtext.
fn extract_language(name: &str, subtext: &str) -> String {
    let text = format!("{name} {subtext}").to_lowercase();
    if contains_any(&text, &["chinese", "中文", "台語", "國語", "粵語"]) {
        "chinese"
    } else if text.contains("english") || contains_any(name, &["BBC", "CNN", "NPR"]) {
        "english"
    } else if contains_any(&text, &["japanese", "日本", "japan"]) {
        "japanese"
    } else if contains_any(&text, &["korean", "韓國", "korea"]) {
        "korean"
    } else if text.contains("french") || text.contains("france") {
        "french"
    } else if has_cjk(name) {
        "chinese"
    } else {
        "unknown"
    }
    .to_string()
}

/// Best-effort country guess from the station name and subtext.
fn extract_country(name: &str, subtext: &str) -> String {
    let text = format!("{name} {subtext}").to_lowercase();
    if contains_any(&text, &["taiwan", "台灣", "台北", "高雄"]) {
        "Taiwan"
    } else if contains_any(&text, &["hong kong", "香港", "hk"]) {
        "Hong Kong"
    } else if contains_any(&text, &["singapore", "新加坡", "sg"]) {
        "Singapore"
    } else if contains_any(&text, &["china", "中國", "beijing", "北京"]) {
        "China"
    } else if contains_any(&text, &["usa", "america", "united states"]) {
        "USA"
    } else if contains_any(&text, &["uk", "britain", "england"]) {
        "UK"
    } else {
        "Unknown"
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<opml version="1">
  <body>
    <outline type="link" text="Local Radio" URL="http://opml.radiotime.com/Browse.ashx?c=local"/>
    <outline type="audio" text="ICRT FM100 Taipei" URL="http://opml.radiotime.com/Tune.ashx?id=s12345"
             subtext="English news from Taiwan" bitrate="128" formats="mp3,aac" guide_id="s12345"
             image="http://cdn.example/icrt.png" reliability="95"/>
    <outline type="audio" text="No Url Station" URL=""/>
    <outline type="audio" text="Podcast Feed" URL="ftp://example.com/feed"/>
  </body>
</opml>"#;

    #[test]
    fn test_parse_splits_stations_and_links() {
        let parsed = parse_outline_document(PAGE, "talk", "unknown").unwrap();
        assert_eq!(parsed.stations.len(), 1);
        assert_eq!(parsed.links.len(), 1);
        assert_eq!(parsed.links[0].text, "Local Radio");
    }

    #[test]
    fn test_station_fields() {
        let parsed = parse_outline_document(PAGE, "talk", "news").unwrap();
        let s = &parsed.stations[0];
        assert_eq!(s.external_id, "s12345");
        assert_eq!(s.codec, "mp3");
        assert_eq!(s.bitrate, 128);
        assert_eq!(s.language, "english");
        assert_eq!(s.country, "Taiwan");
        assert_eq!(s.tags, vec!["hierarchical", "talk"]);
        let placement = s.placement.as_ref().unwrap();
        assert_eq!(placement.category, "talk");
        assert_eq!(placement.subcategory, "news");
        assert_eq!(s.attributes["reliability"], "95");
    }

    #[test]
    fn test_rejects_non_stream_urls() {
        let xml = r#"<opml><body>
            <outline type="audio" text="Page" URL="about:blank"/>
            <outline type="audio" text="Marker" URL="weird://host/tune.ashx?id=1"/>
        </body></opml>"#;
        let parsed = parse_outline_document(xml, "talk", "unknown").unwrap();
        assert_eq!(parsed.stations.len(), 1);
        assert_eq!(parsed.stations[0].name, "Marker");
    }

    #[test]
    fn test_cjk_name_maps_to_chinese() {
        let xml = r#"<opml><body>
            <outline type="audio" text="飛碟電台" URL="http://x.test/stream"/>
        </body></opml>"#;
        let parsed = parse_outline_document(xml, "taiwan", "unknown").unwrap();
        assert_eq!(parsed.stations[0].language, "chinese");
    }

    #[test]
    fn test_sanitize_segment() {
        assert_eq!(sanitize_segment("News & Talk / Local"), "News___Talk___Local");
    }

    #[test]
    fn test_bom_is_tolerated() {
        let xml = format!("\u{feff}{PAGE}");
        assert!(parse_outline_document(&xml, "talk", "unknown").is_ok());
    }
}
