//! Sync reconciliation: make the catalog match this cycle's candidates,
//! scoped per sync group.

use std::collections::HashSet;

use log::{debug, info};

use crate::error::Result;
use crate::models::{StationRecord, SyncGroup, SyncPolicy};
use crate::sources::{SourceOutcome, SourceStatus};
use crate::storage::{CatalogStore, GroupApplyStats};

/// Outcome for one reconciled group.
#[derive(Debug)]
pub struct GroupReport {
    pub group: SyncGroup,
    pub stats: GroupApplyStats,
}

/// Outcome of a full reconciliation pass.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub groups: Vec<GroupReport>,
}

impl ReconcileReport {
    pub fn totals(&self) -> GroupApplyStats {
        let mut totals = GroupApplyStats::default();
        for report in &self.groups {
            totals.inserted += report.stats.inserted;
            totals.updated += report.stats.updated;
            totals.deleted += report.stats.deleted;
            totals.failed += report.stats.failed;
        }
        totals
    }
}

/// Reconcile this cycle's deduplicated candidates against the catalog.
///
/// A group is reconciled only when its source actually succeeded this cycle
/// and the group appears among the candidates. Groups from failed or skipped
/// sources are left untouched, so a transient upstream failure can never
/// cascade into mass deletion.
pub async fn reconcile(
    store: &dyn CatalogStore,
    candidates: Vec<StationRecord>,
    outcomes: &[SourceOutcome],
) -> Result<ReconcileReport> {
    let succeeded: HashSet<_> = outcomes
        .iter()
        .filter(|o| o.status == SourceStatus::Succeeded)
        .map(|o| o.source)
        .collect();

    // group candidates, preserving first-seen group order
    let mut order: Vec<SyncGroup> = Vec::new();
    let mut grouped: std::collections::HashMap<SyncGroup, Vec<StationRecord>> =
        std::collections::HashMap::new();
    for record in candidates {
        let group = SyncGroup::for_record(&record);
        if !grouped.contains_key(&group) {
            order.push(group.clone());
        }
        grouped.entry(group).or_default().push(record);
    }

    let mut report = ReconcileReport::default();
    for group in order {
        if !succeeded.contains(&group.source()) {
            debug!("group {} source did not succeed, left untouched", group.key());
            continue;
        }
        let upserts = grouped.remove(&group).unwrap_or_default();

        let delete_ids = match group.policy() {
            SyncPolicy::Full => {
                let existing = store.group_keys(&group).await?;
                let present: HashSet<_> = upserts.iter().map(|r| r.key()).collect();
                existing
                    .into_iter()
                    .filter(|(key, _)| !present.contains(key))
                    .map(|(_, id)| id)
                    .collect()
            }
            SyncPolicy::Additive => Vec::new(),
        };

        let stats = store.apply(&group, &upserts, &delete_ids).await?;
        info!(
            "group {}: {} inserted, {} updated, {} deleted, {} failed",
            group.key(),
            stats.inserted,
            stats.updated,
            stats.deleted,
            stats.failed
        );
        report.groups.push(GroupReport { group, stats });
    }
    Ok(report)
}
