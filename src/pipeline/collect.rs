//! Runs today's scheduled adapters and gathers their candidates.

use log::{info, warn};

use crate::crawler::{CrawlMode, HttpOutlineFetcher, TreeCrawler};
use crate::models::{Config, SourceId, StationRecord};
use crate::schedule::DayPlan;
use crate::sources::{catalog::CatalogAdapter, manual, SourceOutcome};

/// Everything the adapters produced this cycle.
#[derive(Debug)]
pub struct CollectionResult {
    pub records: Vec<StationRecord>,
    pub outcomes: Vec<SourceOutcome>,
}

/// Run the plan's sources in order: curated list, flat catalog, tree crawl.
/// Strictly sequential; pacing inside each adapter is the only rate control.
pub async fn collect_sources(
    config: &Config,
    plan: &DayPlan,
    client: &reqwest::Client,
) -> CollectionResult {
    let mut records = Vec::new();
    let mut outcomes = Vec::new();

    if plan.run_manual {
        let found = manual::collect(config);
        outcomes.push(SourceOutcome::succeeded(SourceId::Manual, found.len()));
        records.extend(found);
    } else {
        outcomes.push(SourceOutcome::skipped(SourceId::Manual));
    }

    if plan.run_catalog_api {
        let adapter = CatalogAdapter::new(client, &config.catalog_api);
        match adapter.collect().await {
            Ok(found) => {
                outcomes.push(SourceOutcome::succeeded(SourceId::CatalogApi, found.len()));
                records.extend(found);
            }
            Err(e) => {
                warn!("catalog api adapter failed: {e}");
                outcomes.push(SourceOutcome::failed(SourceId::CatalogApi));
            }
        }
    } else {
        outcomes.push(SourceOutcome::skipped(SourceId::CatalogApi));
    }

    match CrawlMode::from_tree(plan.tree_mode) {
        None => outcomes.push(SourceOutcome::skipped(SourceId::Hierarchical)),
        Some(mode) => {
            let fetcher = HttpOutlineFetcher::new(client.clone());
            let mut found = Vec::new();
            let mut requests = 0u32;
            let mut failures = 0u32;
            for category in &plan.categories {
                let Some(root) = config.category_url(category) else {
                    warn!("no root url configured for category {category}, skipped");
                    continue;
                };
                let root = root.to_string();
                let crawler =
                    TreeCrawler::new(&fetcher, mode, category, &config.tree.directory_host);
                let outcome = crawler.collect(&root).await;
                requests += outcome.requests;
                failures += outcome.failures;
                found.extend(outcome.stations);
            }
            info!(
                "tree crawl: {} stations from {} categories ({requests} requests, {failures} failures)",
                found.len(),
                plan.categories.len()
            );
            outcomes.push(SourceOutcome::succeeded(SourceId::Hierarchical, found.len()));
            records.extend(found);
        }
    }

    CollectionResult { records, outcomes }
}
