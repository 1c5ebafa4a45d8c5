//! Curated station list from configuration.

use log::{info, warn};

use crate::models::{Config, SourceId, StationRecord};
use crate::utils::is_http_url;

/// Materialize the configured curated stations. Entries without a playable
/// http(s) URL are dropped with a warning.
pub fn collect(config: &Config) -> Vec<StationRecord> {
    let mut records = Vec::with_capacity(config.stations.len());
    for station in &config.stations {
        if station.name.trim().is_empty() || !is_http_url(station.url.trim()) {
            warn!("curated station {:?} has no playable url, dropped", station.name);
            continue;
        }
        records.push(StationRecord {
            external_id: station.uuid.clone(),
            name: station.name.clone(),
            url: station.url.trim().to_string(),
            homepage: station.homepage.clone(),
            favicon: station.favicon.clone(),
            tags: station.tags.clone(),
            country: station.country.clone(),
            language: station.language.clone(),
            codec: station.codec.clone(),
            bitrate: station.bitrate,
            source: SourceId::Manual,
            source_type: station.source_type.clone(),
            placement: None,
            attributes: station.metadata.clone(),
        });
    }
    info!("curated list: {} stations", records.len());
    records
}
