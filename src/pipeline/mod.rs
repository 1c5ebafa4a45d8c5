//! Daily collection and synchronization pipeline.
//!
//! One cycle is: resolve today's plan, run the scheduled adapters, merge
//! their candidates, then reconcile the catalog group by group.

pub mod collect;
pub mod dedup;
pub mod reconcile;

pub use collect::{collect_sources, CollectionResult};
pub use dedup::{dedup, DedupOutcome};
pub use reconcile::{reconcile, ReconcileReport};

use log::info;

use crate::error::Result;
use crate::models::Config;
use crate::schedule::DayPlan;
use crate::sources::SourceOutcome;
use crate::storage::{CatalogStore, GroupApplyStats};
use crate::utils::http;

/// What one cycle did, for logging and the stats surface.
#[derive(Debug)]
pub struct RunSummary {
    pub plan: DayPlan,
    pub outcomes: Vec<SourceOutcome>,
    pub unique_candidates: usize,
    pub totals: GroupApplyStats,
}

/// Execute one full collection+reconciliation cycle against the store.
pub async fn run_cycle(
    config: &Config,
    plan: DayPlan,
    store: &dyn CatalogStore,
) -> Result<RunSummary> {
    info!("cycle start: {plan}");
    let client = http::create_client(&config.http)?;

    let collection = collect_sources(config, &plan, &client).await;
    let merged = dedup(collection.records);
    let unique_candidates = merged.records.len();
    let report = reconcile(store, merged.records, &collection.outcomes).await?;

    let totals = report.totals();
    info!(
        "cycle done: {unique_candidates} unique candidates, {} inserted, {} updated, {} deleted, {} failed",
        totals.inserted, totals.updated, totals.deleted, totals.failed
    );

    Ok(RunSummary {
        plan,
        outcomes: collection.outcomes,
        unique_candidates,
        totals,
    })
}
