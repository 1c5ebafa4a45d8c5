//! Delay and cooldown model for the tree traversal.
//!
//! All pacing is randomized uniform ranges so the crawler never produces a
//! fixed request rhythm against the upstream directory.

use std::time::Duration;

use rand::Rng;

use super::CrawlMode;
use super::quota::is_large_category;

/// Mode-dependent traversal limits.
#[derive(Debug, Clone, Copy)]
pub struct ModeParams {
    /// Failed-request ceiling; the category run stops once exceeded
    pub max_failures: u32,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Limits for an execution mode.
pub fn params(mode: CrawlMode) -> ModeParams {
    match mode {
        CrawlMode::Broad => ModeParams {
            max_failures: 50,
            timeout: Duration::from_secs(45),
        },
        CrawlMode::Narrow => ModeParams {
            max_failures: 30,
            timeout: Duration::from_secs(30),
        },
    }
}

fn uniform(low: f64, high: f64) -> Duration {
    Duration::from_secs_f64(rand::thread_rng().gen_range(low..high))
}

/// Delay before the root fetch of a top-level category.
pub fn pre_category_delay(mode: CrawlMode) -> Duration {
    match mode {
        CrawlMode::Broad => uniform(10.0, 20.0),
        CrawlMode::Narrow => uniform(2.0, 5.0),
    }
}

/// Delay before fetching one node beyond the root; grows with depth.
pub fn node_delay(mode: CrawlMode, category: &str, depth: u32) -> Duration {
    let (base, penalty) = match mode {
        CrawlMode::Broad => (uniform(5.0, 12.0), 0.8),
        CrawlMode::Narrow if is_large_category(category) => (uniform(1.5, 4.0), 0.3),
        CrawlMode::Narrow => (uniform(0.5, 2.0), 0.2),
    };
    base + Duration::from_secs_f64(depth as f64 * penalty)
}

/// Extra rest after finishing a large category, before the next one.
pub fn category_cooldown(mode: CrawlMode, category: &str) -> Option<Duration> {
    match mode {
        CrawlMode::Broad => Some(uniform(30.0, 60.0)),
        CrawlMode::Narrow if is_large_category(category) => Some(uniform(10.0, 20.0)),
        CrawlMode::Narrow => None,
    }
}

/// Cooldown after an HTTP 403 before any subsequent request.
pub fn access_denied_cooldown(mode: CrawlMode) -> Duration {
    match mode {
        CrawlMode::Broad => uniform(60.0, 120.0),
        CrawlMode::Narrow => uniform(20.0, 40.0),
    }
}

/// Cooldown after an HTTP 429. Mid-recursion hits use a 0.3-scaled window,
/// the full range applies only at the category root.
pub fn rate_limit_cooldown(mode: CrawlMode, depth: u32) -> Duration {
    let (low, high) = match mode {
        CrawlMode::Broad => (90.0, 180.0),
        CrawlMode::Narrow => (30.0, 60.0),
    };
    if depth > 0 {
        uniform(low * 0.3, high * 0.3)
    } else {
        uniform(low, high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn within(d: Duration, low: f64, high: f64) {
        let secs = d.as_secs_f64();
        assert!(secs >= low && secs <= high, "{secs} not in [{low}, {high}]");
    }

    #[test]
    fn test_mode_params() {
        assert_eq!(params(CrawlMode::Broad).max_failures, 50);
        assert_eq!(params(CrawlMode::Narrow).max_failures, 30);
        assert_eq!(params(CrawlMode::Broad).timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_node_delay_ranges() {
        for _ in 0..50 {
            within(node_delay(CrawlMode::Broad, "music", 0), 5.0, 12.0);
            within(node_delay(CrawlMode::Broad, "music", 3), 5.0 + 2.4, 12.0 + 2.4);
            within(node_delay(CrawlMode::Narrow, "talk", 2), 1.5 + 0.6, 4.0 + 0.6);
            within(node_delay(CrawlMode::Narrow, "taiwan", 2), 0.5 + 0.4, 2.0 + 0.4);
        }
    }

    #[test]
    fn test_rate_limit_scaling() {
        for _ in 0..50 {
            within(rate_limit_cooldown(CrawlMode::Narrow, 0), 30.0, 60.0);
            within(rate_limit_cooldown(CrawlMode::Narrow, 2), 9.0, 18.0);
            within(rate_limit_cooldown(CrawlMode::Broad, 1), 27.0, 54.0);
        }
    }

    #[test]
    fn test_category_cooldown_only_for_large() {
        assert!(category_cooldown(CrawlMode::Narrow, "talk").is_some());
        assert!(category_cooldown(CrawlMode::Narrow, "taiwan").is_none());
        assert!(category_cooldown(CrawlMode::Broad, "music").is_some());
    }
}
