//! Per-depth subcategory quotas for the tree traversal.
//!
//! Quotas strictly decrease with depth. Broad mode (Sunday oversized
//! categories) gets larger tables than the weekday narrow slices.

use super::CrawlMode;

/// Narrow-mode categories that count as "large" for pacing and quotas.
const LARGE_NARROW: [&str; 3] = ["talk", "sports", "podcast"];

/// Whether a narrow-mode category is one of the large ones.
pub fn is_large_category(category: &str) -> bool {
    LARGE_NARROW.contains(&category)
}

/// Scalar factor applied to the base quota before truncation.
pub fn subcategory_factor(mode: CrawlMode, category: &str) -> f64 {
    match mode {
        CrawlMode::Broad => 2.0,
        CrawlMode::Narrow => {
            if is_large_category(category) {
                1.0
            } else {
                1.2
            }
        }
    }
}

/// Base quota table for a category, indexed by depth 0..=5.
fn base_quotas(mode: CrawlMode, category: &str) -> [u32; 6] {
    match (mode, category) {
        (CrawlMode::Broad, "music") => [50, 40, 30, 25, 20, 15],
        (CrawlMode::Broad, "location") => [45, 35, 28, 22, 18, 12],
        (CrawlMode::Broad, "language") => [60, 50, 40, 30, 25, 20],
        (CrawlMode::Narrow, "talk") => [25, 20, 15, 12, 10, 8],
        (CrawlMode::Narrow, "sports") => [20, 15, 12, 10, 8, 6],
        (CrawlMode::Narrow, "podcast") => [20, 15, 12, 10, 8, 6],
        (CrawlMode::Narrow, "local") => [15, 12, 10, 8, 6, 5],
        (CrawlMode::Narrow, "taiwan" | "hongkong" | "singapore") => [25, 20, 15, 12, 10, 8],
        _ => [10, 8, 6, 5, 4, 3],
    }
}

/// Maximum number of subcategory links to follow at a node.
///
/// Depths beyond the table reuse the last entry; the factor-scaled result
/// is truncated and floored at 1.
pub fn max_subcategories(mode: CrawlMode, category: &str, depth: u32, factor: f64) -> usize {
    let quotas = base_quotas(mode, category);
    let base = quotas[depth.min(5) as usize];
    ((base as f64 * factor) as usize).max(1)
}
