//! Flat REST catalog adapter.
//!
//! Pulls a fixed set of country/language/tag listings from the public
//! catalog API, one request per listing with fixed pacing in between.

use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{AppError, Result};
use crate::models::{normalize_language, parse_bitrate, CatalogApiConfig, SourceId, StationRecord};
use crate::utils::is_http_url;

/// Listings pulled each cycle: (category label, path, per-listing cap).
const ENDPOINTS: [(&str, &str, Option<usize>); 7] = [
    ("taiwan", "/json/stations/bycountry/taiwan", None),
    ("chinese", "/json/stations/bylanguage/chinese", None),
    ("classical", "/json/stations/bytag/classical", Some(50)),
    ("pop", "/json/stations/bytag/pop", Some(50)),
    ("news", "/json/stations/bytag/news", Some(30)),
    ("jazz", "/json/stations/bytag/jazz", Some(50)),
    ("rock", "/json/stations/bytag/rock", Some(50)),
];

/// One station as served by the catalog API. Unknown fields are ignored;
/// `bitrate` arrives as number or string depending on the mirror.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(default)]
    stationuuid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    homepage: String,
    #[serde(default)]
    favicon: String,
    #[serde(default)]
    tags: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    countrycode: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    codec: String,
    #[serde(default)]
    bitrate: Value,
    #[serde(default)]
    votes: Value,
    #[serde(default)]
    clickcount: Value,
    #[serde(default)]
    lastcheckok: Value,
    #[serde(default)]
    lastchecktime: String,
}

pub struct CatalogAdapter<'a> {
    client: &'a reqwest::Client,
    config: &'a CatalogApiConfig,
}

impl<'a> CatalogAdapter<'a> {
    pub fn new(client: &'a reqwest::Client, config: &'a CatalogApiConfig) -> Self {
        Self { client, config }
    }

    /// Collect all listings. A failed listing is logged and contributes
    /// nothing; the adapter as a whole fails only when every listing does.
    pub async fn collect(&self) -> Result<Vec<StationRecord>> {
        let mut records = Vec::new();
        let mut succeeded = 0usize;
        for (category, path, cap) in ENDPOINTS {
            sleep(Duration::from_millis(self.config.rate_limit_ms)).await;
            match self.fetch_listing(category, path, cap).await {
                Ok(found) => {
                    info!("catalog listing {category}: {} stations", found.len());
                    succeeded += 1;
                    records.extend(found);
                }
                Err(e) => warn!("catalog listing {category} failed: {e}"),
            }
        }
        if succeeded == 0 {
            return Err(AppError::adapter("catalog_api", "every listing failed"));
        }
        info!("catalog api: {} stations total", records.len());
        Ok(records)
    }

    async fn fetch_listing(
        &self,
        category: &str,
        path: &str,
        cap: Option<usize>,
    ) -> Result<Vec<StationRecord>> {
        let url = format!("{}{path}", self.config.base_url);
        let entries: Vec<CatalogEntry> = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let take = cap.unwrap_or(entries.len());
        Ok(entries
            .into_iter()
            .take(take)
            .filter_map(|entry| station_from_entry(entry, category))
            .collect())
    }
}

fn numeric(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0) as u32,
        Value::String(s) => parse_bitrate(s),
        _ => 0,
    }
}

/// Normalize one catalog entry; entries without a name or an absolute
/// http(s) URL are dropped.
fn station_from_entry(entry: CatalogEntry, category: &str) -> Option<StationRecord> {
    let url = entry.url.trim().to_string();
    if entry.name.trim().is_empty() || !is_http_url(&url) {
        return None;
    }

    let mut tags = vec![SourceId::CatalogApi.as_str().to_string(), category.to_string()];
    tags.extend(
        entry
            .tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
    );

    let mut attributes = serde_json::Map::new();
    attributes.insert("votes".into(), Value::from(numeric(&entry.votes)));
    attributes.insert("clickcount".into(), Value::from(numeric(&entry.clickcount)));
    attributes.insert("countrycode".into(), Value::String(entry.countrycode));
    attributes.insert("state".into(), Value::String(entry.state));
    attributes.insert("lastcheckok".into(), Value::from(numeric(&entry.lastcheckok)));
    attributes.insert("lastchecktime".into(), Value::String(entry.lastchecktime));
    attributes.insert("category".into(), Value::String(category.to_string()));

    Some(StationRecord {
        external_id: entry.stationuuid,
        name: entry.name.trim().to_string(),
        url,
        homepage: entry.homepage,
        favicon: entry.favicon,
        tags,
        country: entry.country,
        language: normalize_language(&entry.language),
        codec: if entry.codec.is_empty() {
            "mp3".to_string()
        } else {
            entry.codec
        },
        bitrate: numeric(&entry.bitrate),
        source: SourceId::CatalogApi,
        source_type: "public_api".to_string(),
        placement: None,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(json: serde_json::Value) -> CatalogEntry {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_entry_mapping() {
        let e = entry(serde_json::json!({
            "stationuuid": "abc-123",
            "name": "  Taiwan Jazz  ",
            "url": "https://stream.test/jazz",
            "tags": "jazz, smooth",
            "country": "Taiwan",
            "language": "zh-tw",
            "codec": "AAC",
            "bitrate": 192,
            "votes": 10,
            "clickcount": "7"
        }));
        let record = station_from_entry(e, "jazz").unwrap();
        assert_eq!(record.name, "Taiwan Jazz");
        assert_eq!(record.language, "chinese");
        assert_eq!(record.bitrate, 192);
        assert_eq!(record.tags, vec!["catalog_api", "jazz", "jazz", "smooth"]);
        assert_eq!(record.attributes["clickcount"], 7);
        assert_eq!(record.attributes["category"], "jazz");
    }

    #[test]
    fn test_invalid_urls_rejected() {
        let e = entry(serde_json::json!({"name": "X", "url": "rtsp://stream.test/x"}));
        assert!(station_from_entry(e, "pop").is_none());
        let e = entry(serde_json::json!({"name": "", "url": "http://stream.test/x"}));
        assert!(station_from_entry(e, "pop").is_none());
    }

    #[test]
    fn test_bitrate_string_and_garbage() {
        let e = entry(serde_json::json!({
            "name": "X", "url": "http://s.test/x", "bitrate": "128"
        }));
        assert_eq!(station_from_entry(e, "pop").unwrap().bitrate, 128);
        let e = entry(serde_json::json!({
            "name": "X", "url": "http://s.test/x", "bitrate": "drop table"
        }));
        assert_eq!(station_from_entry(e, "pop").unwrap().bitrate, 0);
    }

    #[test]
    fn test_missing_fields_default() {
        let e = entry(serde_json::json!({"name": "X", "url": "http://s.test/x"}));
        let record = station_from_entry(e, "news").unwrap();
        assert_eq!(record.codec, "mp3");
        assert_eq!(record.language, "unknown");
        assert_eq!(record.bitrate, 0);
    }

    #[test]
    fn test_listing_table_covers_expected_categories() {
        let categories: Vec<&str> = ENDPOINTS.iter().map(|(c, _, _)| *c).collect();
        assert_eq!(
            categories,
            vec!["taiwan", "chinese", "classical", "pop", "news", "jazz", "rock"]
        );
        // only the oversized tag listings are capped
        assert!(ENDPOINTS[0].2.is_none());
        assert_eq!(ENDPOINTS[4].2, Some(30));
    }
}
