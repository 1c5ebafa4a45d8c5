// src/models/mod.rs

//! Domain models for the collector application.

mod config;
mod station;

pub use config::{CatalogApiConfig, CategoryRoot, Config, DatabaseConfig, HttpConfig, ManualStation, TreeConfig};
pub use station::{
    Placement, SourceId, StationKey, StationRecord, SyncGroup, SyncPolicy, normalize_language,
    parse_bitrate, synthetic_uuid,
};
