//! Candidate merging across sources.

use std::collections::{HashMap, HashSet};

use log::info;

use crate::models::{SourceId, StationRecord};

/// Merge result with per-source retention counts.
#[derive(Debug)]
pub struct DedupOutcome {
    pub records: Vec<StationRecord>,
    pub dropped: usize,
    pub kept_by_source: HashMap<SourceId, usize>,
}

/// Collapse candidates onto unique identity pairs.
///
/// Records with an empty URL are discarded up front. The survivor for each
/// identity is the one from the highest-priority source; the sort is stable,
/// so within one source the first occurrence wins.
pub fn dedup(mut records: Vec<StationRecord>) -> DedupOutcome {
    let before = records.len();
    records.retain(|r| !r.url.trim().is_empty());
    records.sort_by_key(|r| r.source.priority());

    let mut seen = HashSet::new();
    let mut kept_by_source: HashMap<SourceId, usize> = HashMap::new();
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.key()) {
            *kept_by_source.entry(record.source).or_default() += 1;
            kept.push(record);
        }
    }

    let dropped = before - kept.len();
    info!("dedup: {before} candidates -> {} unique ({dropped} dropped)", kept.len());
    DedupOutcome {
        records: kept,
        dropped,
        kept_by_source,
    }
}
