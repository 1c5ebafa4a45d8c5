// src/schedule.rs

//! Daily collection schedule resolver.
//!
//! Pure function of the calendar date: which sources run today, which tree
//! categories are in scope, and which crawler execution mode applies. The
//! hierarchical directory is fetched in coarse slices spread over the week
//! so no single day hammers the upstream service.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate};

/// Crawler execution mode for the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeMode {
    /// Hierarchical source does not run
    Off,
    /// Weekday slices: small fixed category combinations
    Narrow,
    /// Sunday slices: one oversized category with larger quotas
    Broad,
}

/// Resolved plan for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayPlan {
    pub date: NaiveDate,
    /// Curated list runs every day
    pub run_manual: bool,
    /// Flat catalog API runs every day
    pub run_catalog_api: bool,
    pub tree_mode: TreeMode,
    /// Tree categories in scope today, empty unless the tree runs
    pub categories: Vec<String>,
}

impl DayPlan {
    pub fn run_tree(&self) -> bool {
        self.tree_mode != TreeMode::Off
    }
}

impl fmt::Display for DayPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tree_mode {
            TreeMode::Off => write!(f, "{}: manual + catalog_api (tree rests)", self.date),
            TreeMode::Narrow => write!(
                f,
                "{}: manual + catalog_api + tree narrow [{}]",
                self.date,
                self.categories.join(", ")
            ),
            TreeMode::Broad => write!(
                f,
                "{}: manual + catalog_api + tree broad [{}]",
                self.date,
                self.categories.join(", ")
            ),
        }
    }
}

/// Week-of-month using the weekday of the 1st as offset:
/// ceil((day + offset) / 7) with Monday = 0.
pub fn week_of_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    let offset = first.weekday().num_days_from_monday();
    (date.day() - 1 + offset) / 7 + 1
}

/// Resolve the collection plan for a date.
pub fn resolve(date: NaiveDate) -> DayPlan {
    let weekday = date.weekday().num_days_from_monday();

    let (tree_mode, categories): (TreeMode, &[&str]) = match weekday {
        0 => (TreeMode::Narrow, &["talk", "taiwan"]),
        1 => (TreeMode::Narrow, &["sports", "hongkong"]),
        2 => (TreeMode::Narrow, &["podcast", "singapore"]),
        3 => (TreeMode::Narrow, &["local"]),
        // Friday and Saturday the tree rests
        4 | 5 => (TreeMode::Off, &[]),
        _ => match week_of_month(date) {
            1 => (TreeMode::Broad, &["music"]),
            2 => (TreeMode::Broad, &["location"]),
            3 => (TreeMode::Broad, &["language"]),
            // Weeks 4 and 5 are Sunday rest days
            _ => (TreeMode::Off, &[]),
        },
    };

    DayPlan {
        date,
        run_manual: true,
        run_catalog_api: true,
        tree_mode,
        categories: categories.iter().map(|c| c.to_string()).collect(),
    }
}

/// Plan for the day after `date`, for operator-facing log output.
pub fn next_plan(date: NaiveDate) -> DayPlan {
    resolve(date.checked_add_days(Days::new(1)).unwrap_or(date))
}
