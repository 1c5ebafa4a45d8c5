//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Catalog database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Flat JSON catalog source settings
    #[serde(default)]
    pub catalog_api: CatalogApiConfig,

    /// Hierarchical OPML directory settings
    #[serde(default)]
    pub tree: TreeConfig,

    /// Curated station list (the `manual` source)
    #[serde(default = "defaults::stations")]
    pub stations: Vec<ManualStation>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.database.path.trim().is_empty() {
            return Err(AppError::validation("database.path is empty"));
        }
        if !self.catalog_api.base_url.starts_with("http") {
            return Err(AppError::validation("catalog_api.base_url must be a URL"));
        }
        if self.tree.directory_host.trim().is_empty() {
            return Err(AppError::validation("tree.directory_host is empty"));
        }
        if self.tree.categories.is_empty() {
            return Err(AppError::validation("no tree categories defined"));
        }
        for category in &self.tree.categories {
            if !category.url.starts_with("http") {
                return Err(AppError::validation(format!(
                    "tree category '{}' has a non-URL root",
                    category.name
                )));
            }
        }
        for station in &self.stations {
            if station.name.trim().is_empty() || station.url.trim().is_empty() {
                return Err(AppError::validation(
                    "curated stations require a name and a url",
                ));
            }
        }
        Ok(())
    }

    /// Root URL for a named tree category, if configured.
    pub fn category_url(&self, name: &str) -> Option<&str> {
        self.tree
            .categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.url.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            database: DatabaseConfig::default(),
            catalog_api: CatalogApiConfig::default(),
            tree: TreeConfig::default(),
            stations: defaults::stations(),
        }
    }
}

/// HTTP client settings shared by all adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Default request timeout in seconds (the crawler overrides this
    /// per execution mode)
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Catalog database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "defaults::database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: defaults::database_path(),
        }
    }
}

/// Flat JSON catalog API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogApiConfig {
    /// Base URL of the catalog service
    #[serde(default = "defaults::catalog_base_url")]
    pub base_url: String,

    /// Pause between endpoint calls in milliseconds
    #[serde(default = "defaults::catalog_rate_limit")]
    pub rate_limit_ms: u64,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::catalog_timeout")]
    pub timeout_secs: u64,
}

impl Default for CatalogApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::catalog_base_url(),
            rate_limit_ms: defaults::catalog_rate_limit(),
            timeout_secs: defaults::catalog_timeout(),
        }
    }
}

/// Hierarchical OPML directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Host the crawler is allowed to follow subcategory links into
    #[serde(default = "defaults::directory_host")]
    pub directory_host: String,

    /// Category name to root-URL mapping; the schedule resolver picks
    /// which of these run on a given day
    #[serde(default = "defaults::categories")]
    pub categories: Vec<CategoryRoot>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            directory_host: defaults::directory_host(),
            categories: defaults::categories(),
        }
    }
}

/// A named tree category with its directory root URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRoot {
    pub name: String,
    pub url: String,
}

/// One curated station entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualStation {
    pub uuid: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub favicon: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub language: String,
    #[serde(default = "defaults::codec")]
    pub codec: String,
    #[serde(default)]
    pub bitrate: u32,
    #[serde(default = "defaults::manual_source_type")]
    pub source_type: String,
    /// Opaque metadata carried into the catalog
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

mod defaults {
    use serde_json::json;

    use super::{CategoryRoot, ManualStation};

    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; radiosync/1.0)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn database_path() -> String {
        "radio_stations.db".into()
    }
    pub fn catalog_base_url() -> String {
        "https://all.api.radio-browser.info".into()
    }
    pub fn catalog_rate_limit() -> u64 {
        1000
    }
    pub fn catalog_timeout() -> u64 {
        10
    }
    pub fn directory_host() -> String {
        "opml.radiotime.com".into()
    }
    pub fn codec() -> String {
        "mp3".into()
    }
    pub fn manual_source_type() -> String {
        "manual_premium".into()
    }

    pub fn categories() -> Vec<CategoryRoot> {
        let roots = [
            ("talk", "http://opml.radiotime.com/Browse.ashx?c=talk"),
            ("sports", "http://opml.radiotime.com/Browse.ashx?c=sports"),
            ("podcast", "http://opml.radiotime.com/Browse.ashx?c=podcast"),
            ("local", "http://opml.radiotime.com/Browse.ashx?c=local"),
            ("taiwan", "http://opml.radiotime.com/Browse.ashx?id=r101302"),
            ("hongkong", "http://opml.radiotime.com/Browse.ashx?id=r101296"),
            ("singapore", "http://opml.radiotime.com/Browse.ashx?id=r101297"),
            ("music", "http://opml.radiotime.com/Browse.ashx?c=music"),
            ("location", "http://opml.radiotime.com/Browse.ashx?id=r0"),
            ("language", "http://opml.radiotime.com/Browse.ashx?c=lang"),
        ];
        roots
            .into_iter()
            .map(|(name, url)| CategoryRoot {
                name: name.to_string(),
                url: url.to_string(),
            })
            .collect()
    }

    fn station(
        uuid: &str,
        name: &str,
        url: &str,
        homepage: &str,
        tags: &[&str],
        language: &str,
        source_type: &str,
        metadata: serde_json::Value,
    ) -> ManualStation {
        ManualStation {
            uuid: uuid.to_string(),
            name: name.to_string(),
            url: url.to_string(),
            homepage: homepage.to_string(),
            favicon: format!("{}/favicon.ico", homepage),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            country: "Taiwan".to_string(),
            language: language.to_string(),
            codec: codec(),
            bitrate: 128,
            source_type: source_type.to_string(),
            metadata: match metadata {
                serde_json::Value::Object(map) => map,
                _ => serde_json::Map::new(),
            },
        }
    }

    pub fn stations() -> Vec<ManualStation> {
        vec![
            station(
                "manual_icrt_fm100",
                "ICRT FM100.7",
                "https://live.leanstream.co/ICRTFM-MP3",
                "https://www.icrt.com.tw",
                &["english", "taiwan", "news", "music", "premium"],
                "english",
                "manual_premium",
                json!({"verified": true, "quality": "high"}),
            ),
            station(
                "manual_good_radio_989",
                "好事989 Good Radio",
                "https://stream.rcs.revma.com/3yyys8mpkr3uv",
                "https://www.goodradio.com.tw",
                &["taiwan", "good_music", "premium", "easy_listening", "chinese"],
                "chinese",
                "manual_premium",
                json!({"verified": true, "quality": "high"}),
            ),
            station(
                "manual_hit_fm",
                "Hit FM 聯播網 FM107.7",
                "https://live.leanstream.co/HITFM-MP3",
                "https://www.hitoradio.com",
                &["taiwan", "pop", "chinese", "music", "premium"],
                "chinese",
                "manual_premium",
                json!({"verified": true, "popular": true}),
            ),
            station(
                "manual_bcc_music",
                "中廣音樂網 FM96.3",
                "https://stream.rcs.revma.com/ue4wkzdt08uv",
                "https://www.bcc.com.tw",
                &["taiwan", "music", "classical", "chinese", "premium"],
                "chinese",
                "manual_premium",
                json!({"verified": true, "genre": "music"}),
            ),
            station(
                "manual_kiss_radio",
                "KISS Radio 大眾廣播 FM99.9",
                "https://stream.rcs.revma.com/d8n8j3ca3k8uv",
                "https://www.kiss.com.tw",
                &["taiwan", "pop", "music", "chinese", "premium"],
                "chinese",
                "manual_premium",
                json!({"verified": true, "popular": true}),
            ),
            station(
                "manual_police_radio",
                "警察廣播電台",
                "https://cast.npa.gov.tw/live/pbs_128.m3u8",
                "https://www.pbs.gov.tw",
                &["taiwan", "government", "public", "chinese"],
                "chinese",
                "manual_government",
                json!({"verified": true, "official": true}),
            ),
            station(
                "manual_ner_news",
                "國立教育廣播電台",
                "https://live-ner.cdn.hinet.net/live/ner1/playlist.m3u8",
                "https://www.ner.gov.tw",
                &["taiwan", "education", "government", "chinese"],
                "chinese",
                "manual_government",
                json!({"verified": true, "education": true}),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_station_without_url() {
        let mut config = Config::default();
        config.stations[0].url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_categories_cover_schedule() {
        let config = Config::default();
        for name in [
            "talk",
            "sports",
            "podcast",
            "local",
            "taiwan",
            "hongkong",
            "singapore",
            "music",
            "location",
            "language",
        ] {
            assert!(config.category_url(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str(
            r#"
            [database]
            path = "/tmp/test.db"

            [[stations]]
            uuid = "manual_x"
            name = "X FM"
            url = "https://example.com/x"
            "#,
        )
        .unwrap();
        assert_eq!(config.database.path, "/tmp/test.db");
        assert_eq!(config.stations.len(), 1);
        assert_eq!(config.stations[0].source_type, "manual_premium");
        // Unspecified sections fall back to defaults
        assert!(!config.tree.categories.is_empty());
    }
}
