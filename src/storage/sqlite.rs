//! SQLite-backed catalog store.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use log::{debug, warn};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;

use crate::error::Result;
use crate::models::{StationKey, StationRecord, SyncGroup};

use super::{CatalogStats, CatalogStore, GroupApplyStats, Page, StationFilter, StationRow};

/// SQLite uses file-level locking; keep the pool small.
const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT_MS: u32 = 5000;

const ROW_COLUMNS: &str = "id, uuid, name, url, homepage, favicon, tags, country, language, \
     codec, bitrate, source_api, source_type, category, subcategory, collection_date";

/// Catalog store over a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Open (creating if absent) a file-backed catalog, enable WAL mode and
    /// run pending migrations.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(&db_url)
            .await?;

        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        sqlx::query(&format!("PRAGMA busy_timeout={BUSY_TIMEOUT_MS}"))
            .execute(&pool)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// In-memory catalog for tests.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Filtered, paginated listing ordered by source priority then name.
    pub async fn list(&self, filter: &StationFilter, page: Page) -> Result<Vec<StationRow>> {
        let mut qb = QueryBuilder::new(format!("SELECT {ROW_COLUMNS} FROM stations WHERE 1=1"));
        if let Some(country) = &filter.country {
            qb.push(" AND country LIKE ");
            qb.push_bind(format!("%{country}%"));
        }
        if let Some(language) = &filter.language {
            qb.push(" AND language LIKE ");
            qb.push_bind(format!("%{language}%"));
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            qb.push(" AND (name LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR tags LIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
        qb.push(
            " ORDER BY CASE source_api \
               WHEN 'manual' THEN 1 \
               WHEN 'hierarchical' THEN 2 \
               WHEN 'catalog_api' THEN 3 \
               ELSE 9 END, name",
        );
        qb.push(" LIMIT ");
        qb.push_bind(page.limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(page.offset() as i64);

        Ok(qb.build_query_as::<StationRow>().fetch_all(&self.pool).await?)
    }

    /// Free-text search over name, tags and country, name matches first.
    pub async fn search(&self, query: &str) -> Result<Vec<StationRow>> {
        let pattern = format!("%{query}%");
        let rows = sqlx::query_as::<_, StationRow>(&format!(
            "SELECT {ROW_COLUMNS} FROM stations \
             WHERE name LIKE ?1 OR tags LIKE ?1 OR country LIKE ?1 \
             ORDER BY CASE WHEN name LIKE ?1 THEN 1 ELSE 2 END, name \
             LIMIT 100"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// The manually curated rows, the "featured" set.
    pub async fn featured(&self) -> Result<Vec<StationRow>> {
        let rows = sqlx::query_as::<_, StationRow>(&format!(
            "SELECT {ROW_COLUMNS} FROM stations WHERE source_api = 'manual' \
             ORDER BY name LIMIT 20"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Aggregate counts for the stats surface.
    pub async fn stats(&self) -> Result<CatalogStats> {
        let total = self.count().await?;
        let last_collection: Option<String> =
            sqlx::query_scalar("SELECT MAX(collection_date) FROM stations")
                .fetch_one(&self.pool)
                .await?;
        let by_source: Vec<(String, i64)> = sqlx::query_as(
            "SELECT source_api, COUNT(*) FROM stations GROUP BY source_api ORDER BY COUNT(*) DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        let by_country: Vec<(String, i64)> = sqlx::query_as(
            "SELECT country, COUNT(*) FROM stations WHERE country != '' \
             GROUP BY country ORDER BY COUNT(*) DESC LIMIT 10",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(CatalogStats {
            total,
            by_source,
            by_country,
            last_collection,
        })
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn group_keys(&self, group: &SyncGroup) -> Result<HashMap<StationKey, i64>> {
        let rows: Vec<(i64, String, String)> = match group {
            SyncGroup::Manual | SyncGroup::CatalogApi => {
                sqlx::query_as("SELECT id, name, url FROM stations WHERE source_api = ?")
                    .bind(group.source().as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            SyncGroup::Hierarchical {
                category,
                subcategory,
            } => {
                sqlx::query_as(
                    "SELECT id, name, url FROM stations \
                     WHERE source_api = 'hierarchical' AND category = ? AND subcategory = ?",
                )
                .bind(category)
                .bind(subcategory)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows
            .into_iter()
            .map(|(id, name, url)| (StationKey::new(&name, &url), id))
            .collect())
    }

    async fn apply(
        &self,
        group: &SyncGroup,
        upserts: &[StationRecord],
        delete_ids: &[i64],
    ) -> Result<GroupApplyStats> {
        let mut stats = GroupApplyStats::default();
        let mut tx = self.pool.begin().await?;
        let source = group.source().as_str();

        for record in upserts {
            let existing: std::result::Result<Option<(i64,)>, sqlx::Error> = sqlx::query_as(
                "SELECT id FROM stations WHERE name = ? AND url = ? AND source_api = ?",
            )
            .bind(&record.name)
            .bind(&record.url)
            .bind(source)
            .fetch_optional(&mut *tx)
            .await;

            let (category, subcategory) = match &record.placement {
                Some(p) => (Some(p.category.as_str()), Some(p.subcategory.as_str())),
                None => (None, None),
            };

            let outcome = match existing {
                Ok(Some((id,))) => sqlx::query(
                    "UPDATE stations SET homepage = ?, favicon = ?, tags = ?, country = ?, \
                     language = ?, codec = ?, bitrate = ?, source_type = ?, category = ?, \
                     subcategory = ?, metadata = ?, collection_date = CURRENT_TIMESTAMP \
                     WHERE id = ?",
                )
                .bind(&record.homepage)
                .bind(&record.favicon)
                .bind(record.tags_joined())
                .bind(&record.country)
                .bind(&record.language)
                .bind(&record.codec)
                .bind(record.bitrate as i64)
                .bind(&record.source_type)
                .bind(category)
                .bind(subcategory)
                .bind(record.attributes_json())
                .bind(id)
                .execute(&mut *tx)
                .await
                .map(|_| stats.updated += 1),
                Ok(None) => sqlx::query(
                    "INSERT INTO stations (uuid, name, url, homepage, favicon, tags, country, \
                     language, codec, bitrate, source_api, source_type, category, subcategory, \
                     metadata) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(record.uuid())
                .bind(&record.name)
                .bind(&record.url)
                .bind(&record.homepage)
                .bind(&record.favicon)
                .bind(record.tags_joined())
                .bind(&record.country)
                .bind(&record.language)
                .bind(&record.codec)
                .bind(record.bitrate as i64)
                .bind(source)
                .bind(&record.source_type)
                .bind(category)
                .bind(subcategory)
                .bind(record.attributes_json())
                .execute(&mut *tx)
                .await
                .map(|_| stats.inserted += 1),
                Err(e) => Err(e),
            };

            if let Err(e) = outcome {
                warn!("row upsert failed for {} ({}): {e}", record.name, record.url);
                stats.failed += 1;
            }
        }

        for id in delete_ids {
            match sqlx::query("DELETE FROM stations WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
            {
                Ok(_) => stats.deleted += 1,
                Err(e) => {
                    warn!("row delete failed for id {id}: {e}");
                    stats.failed += 1;
                }
            }
        }

        tx.commit().await?;
        debug!(
            "group {}: +{} ~{} -{} !{}",
            group.key(),
            stats.inserted,
            stats.updated,
            stats.deleted,
            stats.failed
        );
        Ok(stats)
    }

    async fn count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stations")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
