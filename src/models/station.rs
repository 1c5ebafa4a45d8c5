//! Station record types shared by every source adapter.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Which adapter produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Curated list shipped with the configuration
    Manual,
    /// Recursive OPML directory crawler
    Hierarchical,
    /// Flat public JSON catalog
    CatalogApi,
}

impl SourceId {
    /// Database string representation (`source_api` column).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Hierarchical => "hierarchical",
            Self::CatalogApi => "catalog_api",
        }
    }

    /// Deduplication priority; lower wins. Unknown sources rank 999.
    pub fn priority(&self) -> u32 {
        match self {
            Self::Manual => 1,
            Self::Hierarchical => 2,
            Self::CatalogApi => 3,
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where in the directory tree a hierarchical record was found.
///
/// Stored as dedicated columns and matched by equality, never by substring
/// search over serialized metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// Top-level traversal category (e.g. "talk", "music")
    pub category: String,
    /// Sanitized subtree path element, "unknown" at the category root
    pub subcategory: String,
}

impl Placement {
    pub fn new(category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
        }
    }
}

/// Identity pair used for deduplication and reconciliation.
///
/// Two records with the same key are the same station regardless of which
/// source observed them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StationKey {
    /// Lower-cased, trimmed display name
    pub name: String,
    /// Trimmed stream URL
    pub url: String,
}

impl StationKey {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            url: url.trim().to_string(),
        }
    }
}

/// A normalized station observation produced by one adapter for one cycle.
///
/// Transient: records are merged, reconciled against the catalog, and
/// discarded. They are never persisted directly.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecord {
    /// Per-source identifier; may be empty, in which case a synthetic
    /// uuid is derived at insert time
    pub external_id: String,
    /// Human-readable name (required for identity)
    pub name: String,
    /// Playable endpoint (required for identity)
    pub url: String,
    pub homepage: String,
    pub favicon: String,
    /// Free-text labels with source/category provenance first
    pub tags: Vec<String>,
    pub country: String,
    pub language: String,
    pub codec: String,
    /// Kilobits per second; 0 when the upstream value was absent or junk
    pub bitrate: u32,
    pub source: SourceId,
    /// Adapter-specific subtype (e.g. "manual_premium", "public_api")
    pub source_type: String,
    /// Structured traversal position, hierarchical source only
    pub placement: Option<Placement>,
    /// Opaque source-specific metadata, serialized as-is into the catalog
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl StationRecord {
    /// Identity pair for dedup/reconciliation.
    pub fn key(&self) -> StationKey {
        StationKey::new(&self.name, &self.url)
    }

    /// Source-supplied id, or a deterministic synthetic one.
    pub fn uuid(&self) -> String {
        if self.external_id.trim().is_empty() {
            synthetic_uuid(self.source.as_str(), &self.url)
        } else {
            self.external_id.clone()
        }
    }

    /// Comma-joined tag string for the catalog `tags` column.
    pub fn tags_joined(&self) -> String {
        self.tags.join(",")
    }

    /// Serialized metadata bag for the catalog `metadata` column.
    pub fn attributes_json(&self) -> String {
        serde_json::Value::Object(self.attributes.clone()).to_string()
    }
}

/// Deterministic uuid for records whose source supplies no stable id.
pub fn synthetic_uuid(prefix: &str, url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    format!("{}_{}", prefix, &hex::encode(digest)[..8])
}

/// Canonicalize an upstream language label.
///
/// Known aliases collapse onto one canonical name, unrecognized values pass
/// through unchanged, absent values become "unknown".
pub fn normalize_language(raw: &str) -> String {
    let lang = raw.trim().to_lowercase();
    if lang.is_empty() {
        return "unknown".to_string();
    }
    match lang.as_str() {
        "chinese" | "mandarin" | "cantonese" | "zh" | "zh-cn" | "zh-tw" => "chinese",
        "english" | "en" => "english",
        "japanese" | "ja" => "japanese",
        "korean" | "ko" => "korean",
        "french" | "fr" => "french",
        "german" | "de" => "german",
        "spanish" | "es" => "spanish",
        _ => return lang,
    }
    .to_string()
}

/// Parse a free-text bitrate value, defaulting to 0 on failure.
///
/// One policy for every adapter: the flat catalog reports bitrate as a
/// number, the OPML directory as attacker-controlled text.
pub fn parse_bitrate(raw: &str) -> u32 {
    raw.trim().parse().unwrap_or(0)
}

/// A named partition of the candidate/catalog space reconciled as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyncGroup {
    Manual,
    CatalogApi,
    Hierarchical {
        category: String,
        subcategory: String,
    },
}

/// How a group's catalog rows are reconciled against this cycle's candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    /// Candidates define the complete desired state: insert, update, delete
    Full,
    /// Insert/update only; absence never deletes
    Additive,
}

impl SyncGroup {
    /// Derive the group a record belongs to.
    pub fn for_record(record: &StationRecord) -> Self {
        match record.source {
            SourceId::Manual => Self::Manual,
            SourceId::CatalogApi => Self::CatalogApi,
            SourceId::Hierarchical => match &record.placement {
                Some(p) => Self::Hierarchical {
                    category: p.category.clone(),
                    subcategory: p.subcategory.clone(),
                },
                None => Self::Hierarchical {
                    category: "unknown".to_string(),
                    subcategory: "unknown".to_string(),
                },
            },
        }
    }

    /// Stable string key, e.g. "hierarchical_talk_politics".
    pub fn key(&self) -> String {
        match self {
            Self::Manual => "manual".to_string(),
            Self::CatalogApi => "catalog_api".to_string(),
            Self::Hierarchical {
                category,
                subcategory,
            } => format!("hierarchical_{}_{}", category, subcategory),
        }
    }

    /// The source every member of this group came from.
    pub fn source(&self) -> SourceId {
        match self {
            Self::Manual => SourceId::Manual,
            Self::CatalogApi => SourceId::CatalogApi,
            Self::Hierarchical { .. } => SourceId::Hierarchical,
        }
    }

    /// Sync policy: the flat catalog and every hierarchical slice are
    /// fully owned by their source; everything else only accretes.
    pub fn policy(&self) -> SyncPolicy {
        match self {
            Self::CatalogApi | Self::Hierarchical { .. } => SyncPolicy::Full,
            Self::Manual => SyncPolicy::Additive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(source: SourceId) -> StationRecord {
        StationRecord {
            external_id: String::new(),
            name: "Test FM".to_string(),
            url: "https://example.com/stream".to_string(),
            homepage: String::new(),
            favicon: String::new(),
            tags: vec!["test".to_string(), "fm".to_string()],
            country: "Taiwan".to_string(),
            language: "chinese".to_string(),
            codec: "mp3".to_string(),
            bitrate: 128,
            source,
            source_type: "test".to_string(),
            placement: None,
            attributes: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_key_folds_case_and_trims() {
        let a = StationKey::new(" BBC World ", "https://example.com/s ");
        let b = StationKey::new("bbc world", "https://example.com/s");
        assert_eq!(a, b);
    }

    #[test]
    fn test_source_priorities() {
        assert!(SourceId::Manual.priority() < SourceId::Hierarchical.priority());
        assert!(SourceId::Hierarchical.priority() < SourceId::CatalogApi.priority());
    }

    #[test]
    fn test_normalize_language_aliases() {
        assert_eq!(normalize_language("zh-tw"), "chinese");
        assert_eq!(normalize_language("Mandarin"), "chinese");
        assert_eq!(normalize_language("EN"), "english");
        assert_eq!(normalize_language(""), "unknown");
        assert_eq!(normalize_language("klingon"), "klingon");
    }

    #[test]
    fn test_parse_bitrate_defaults_to_zero() {
        assert_eq!(parse_bitrate("128"), 128);
        assert_eq!(parse_bitrate(" 320 "), 320);
        assert_eq!(parse_bitrate("high"), 0);
        assert_eq!(parse_bitrate(""), 0);
        assert_eq!(parse_bitrate("-1"), 0);
    }

    #[test]
    fn test_synthetic_uuid_is_stable() {
        let a = synthetic_uuid("hierarchical", "https://example.com/a");
        let b = synthetic_uuid("hierarchical", "https://example.com/a");
        assert_eq!(a, b);
        assert!(a.starts_with("hierarchical_"));
        assert_eq!(a.len(), "hierarchical_".len() + 8);
    }

    #[test]
    fn test_group_key_derivation() {
        assert_eq!(SyncGroup::for_record(&sample_record(SourceId::Manual)).key(), "manual");
        assert_eq!(
            SyncGroup::for_record(&sample_record(SourceId::CatalogApi)).key(),
            "catalog_api"
        );

        let mut tree = sample_record(SourceId::Hierarchical);
        assert_eq!(
            SyncGroup::for_record(&tree).key(),
            "hierarchical_unknown_unknown"
        );
        tree.placement = Some(Placement::new("talk", "politics"));
        assert_eq!(
            SyncGroup::for_record(&tree).key(),
            "hierarchical_talk_politics"
        );
    }

    #[test]
    fn test_policy_pattern() {
        // Exact "catalog_api" and the "hierarchical_" prefix get full sync,
        // everything else is additive.
        let manual = SyncGroup::Manual;
        let catalog = SyncGroup::CatalogApi;
        let tree = SyncGroup::Hierarchical {
            category: "music".into(),
            subcategory: "jazz".into(),
        };
        assert_eq!(manual.policy(), SyncPolicy::Additive);
        assert_eq!(catalog.policy(), SyncPolicy::Full);
        assert_eq!(tree.policy(), SyncPolicy::Full);
        assert!(tree.key().starts_with("hierarchical_"));
    }

    #[test]
    fn test_uuid_prefers_external_id() {
        let mut record = sample_record(SourceId::Manual);
        record.external_id = "manual_icrt_fm100".to_string();
        assert_eq!(record.uuid(), "manual_icrt_fm100");
        record.external_id = "  ".to_string();
        assert!(record.uuid().starts_with("manual_"));
    }
}
