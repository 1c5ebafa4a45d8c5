//! Source adapters.
//!
//! Each adapter turns one upstream source into normalized station records.
//! Adapters never touch the catalog; the pipeline owns persistence.

pub mod catalog;
pub mod manual;

use crate::models::SourceId;

/// How one source's collection ended this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// Collection ran and produced a (possibly empty) record set
    Succeeded,
    /// The schedule did not select this source today
    Skipped,
    /// Collection failed entirely; the source contributed nothing
    Failed,
}

/// Per-source summary of one collection cycle.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub source: SourceId,
    pub status: SourceStatus,
    pub found: usize,
}

impl SourceOutcome {
    pub fn succeeded(source: SourceId, found: usize) -> Self {
        Self {
            source,
            status: SourceStatus::Succeeded,
            found,
        }
    }

    pub fn skipped(source: SourceId) -> Self {
        Self {
            source,
            status: SourceStatus::Skipped,
            found: 0,
        }
    }

    pub fn failed(source: SourceId) -> Self {
        Self {
            source,
            status: SourceStatus::Failed,
            found: 0,
        }
    }
}
