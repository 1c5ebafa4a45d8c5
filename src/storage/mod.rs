//! Catalog persistence.
//!
//! The reconciler talks to storage only through [`CatalogStore`], so the
//! sync semantics can be exercised against an in-memory database.

pub mod sqlite;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;

use crate::error::Result;
use crate::models::{StationKey, StationRecord, SyncGroup};

pub use sqlite::SqliteCatalog;

/// A persisted catalog row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StationRow {
    pub id: i64,
    pub uuid: String,
    pub name: String,
    pub url: String,
    pub homepage: String,
    pub favicon: String,
    pub tags: String,
    pub country: String,
    pub language: String,
    pub codec: String,
    pub bitrate: i64,
    pub source_api: String,
    pub source_type: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub collection_date: String,
}

/// Row-level outcome of applying one sync group.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GroupApplyStats {
    pub inserted: u32,
    pub updated: u32,
    pub deleted: u32,
    pub failed: u32,
}

impl GroupApplyStats {
    pub fn touched(&self) -> u32 {
        self.inserted + self.updated + self.deleted
    }
}

/// Listing filters for the query interface. All filters are optional and
/// combined with AND; country/language match by substring, `search` runs
/// over name and tags.
#[derive(Debug, Default, Clone)]
pub struct StationFilter {
    pub country: Option<String>,
    pub language: Option<String>,
    pub search: Option<String>,
}

/// Pagination window. `limit` is clamped to [`Page::MAX_LIMIT`].
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub const MAX_LIMIT: u32 = 200;

    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.limit
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, 50)
    }
}

/// Aggregate catalog statistics.
#[derive(Debug, Default, Serialize)]
pub struct CatalogStats {
    pub total: i64,
    pub by_source: Vec<(String, i64)>,
    pub by_country: Vec<(String, i64)>,
    /// Timestamp of the most recently touched row, if any
    pub last_collection: Option<String>,
}

/// Mutation surface the reconciler needs from the catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Identity pairs currently persisted for a group, with their row ids.
    async fn group_keys(&self, group: &SyncGroup) -> Result<HashMap<StationKey, i64>>;

    /// Apply one group's changes inside a single transaction. Row-level
    /// failures are logged and counted, not propagated.
    async fn apply(
        &self,
        group: &SyncGroup,
        upserts: &[StationRecord],
        delete_ids: &[i64],
    ) -> Result<GroupApplyStats>;

    /// Total row count (health check).
    async fn count(&self) -> Result<i64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamps_limit() {
        let page = Page::new(0, 1000);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, Page::MAX_LIMIT);
        assert_eq!(page.offset(), 0);
        assert_eq!(Page::new(3, 50).offset(), 100);
    }

    #[test]
    fn test_group_apply_stats_touched() {
        let stats = GroupApplyStats {
            inserted: 2,
            updated: 3,
            deleted: 1,
            failed: 4,
        };
        assert_eq!(stats.touched(), 6);
    }
}
