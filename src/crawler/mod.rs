//! Depth-limited recursive crawler for the OPML directory tree.
//!
//! One `TreeCrawler` handles one top-level category. Traversal is strictly
//! sequential; politeness comes from randomized delays ([`pacing`]) and
//! per-depth link quotas ([`quota`]).

pub mod opml;
pub mod pacing;
pub mod quota;

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use log::{debug, info, warn};
use tokio::time::sleep;

use crate::error::{AppError, Result};
use crate::models::StationRecord;
use crate::schedule::TreeMode;
use crate::utils::host_matches;

use opml::sanitize_segment;
use pacing::ModeParams;

/// Directory traversal depth and quota regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlMode {
    /// Weekday slice over small categories
    Narrow,
    /// Sunday deep pass over the oversized categories
    Broad,
}

impl CrawlMode {
    pub fn from_tree(mode: TreeMode) -> Option<Self> {
        match mode {
            TreeMode::Off => None,
            TreeMode::Narrow => Some(CrawlMode::Narrow),
            TreeMode::Broad => Some(CrawlMode::Broad),
        }
    }
}

/// Fetches one outline page. Seam for exercising the traversal against
/// synthetic directory graphs.
#[async_trait]
pub trait OutlineFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String>;
}

/// Production fetcher backed by the shared HTTP client.
pub struct HttpOutlineFetcher {
    client: reqwest::Client,
}

impl HttpOutlineFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OutlineFetcher for HttpOutlineFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        let status = response.status();
        if status.as_u16() == 403 {
            return Err(AppError::AccessDenied(url.to_string()));
        }
        if status.as_u16() == 429 {
            return Err(AppError::RateLimited(url.to_string()));
        }
        if !status.is_success() {
            return Err(AppError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Result of one category run.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub stations: Vec<StationRecord>,
    pub requests: u32,
    pub failures: u32,
}

/// Recursive crawler for a single top-level category.
pub struct TreeCrawler<'a> {
    fetcher: &'a dyn OutlineFetcher,
    mode: CrawlMode,
    category: String,
    factor: f64,
    directory_host: String,
    params: ModeParams,
    requests: u32,
    failures: u32,
}

impl<'a> TreeCrawler<'a> {
    pub fn new(
        fetcher: &'a dyn OutlineFetcher,
        mode: CrawlMode,
        category: &str,
        directory_host: &str,
    ) -> Self {
        Self {
            fetcher,
            mode,
            category: category.to_string(),
            factor: quota::subcategory_factor(mode, category),
            directory_host: directory_host.to_string(),
            params: pacing::params(mode),
            requests: 0,
            failures: 0,
        }
    }

    /// Run the category from its root URL, including the pre-category delay
    /// and the post-category cooldown.
    pub async fn collect(mut self, root_url: &str) -> CrawlOutcome {
        sleep(pacing::pre_category_delay(self.mode)).await;
        info!("category {} traversal starting", self.category);

        let stations = self
            .walk(root_url.to_string(), "unknown".to_string(), 0, HashSet::new())
            .await;

        info!(
            "category {} done: {} stations, {} requests, {} failures",
            self.category,
            stations.len(),
            self.requests,
            self.failures
        );
        if let Some(cooldown) = pacing::category_cooldown(self.mode, &self.category) {
            debug!("category {} cooldown {:.1}s", self.category, cooldown.as_secs_f64());
            sleep(cooldown).await;
        }

        CrawlOutcome {
            stations,
            requests: self.requests,
            failures: self.failures,
        }
    }

    /// Visit one node and, within quota, its subcategory links. Each child
    /// branch gets its own copy of the visited set, so parallel branches may
    /// revisit a URL but no cycle can recurse forever.
    fn walk<'b>(
        &'b mut self,
        url: String,
        subcategory: String,
        depth: u32,
        mut visited: HashSet<String>,
    ) -> BoxFuture<'b, Vec<StationRecord>> {
        async move {
            if self.failures > self.params.max_failures {
                warn!(
                    "category {} abandoned: {} failures",
                    self.category, self.failures
                );
                return Vec::new();
            }
            if !visited.insert(url.clone()) {
                return Vec::new();
            }
            if depth > 0 {
                sleep(pacing::node_delay(self.mode, &self.category, depth)).await;
            }

            self.requests += 1;
            let body = match self.fetcher.fetch(&url, self.params.timeout).await {
                Ok(body) => body,
                Err(AppError::AccessDenied(_)) => {
                    self.failures += 1;
                    warn!("403 at {url}, backing off");
                    sleep(pacing::access_denied_cooldown(self.mode)).await;
                    return Vec::new();
                }
                Err(AppError::RateLimited(_)) => {
                    self.failures += 1;
                    warn!("429 at {url} (depth {depth}), backing off");
                    sleep(pacing::rate_limit_cooldown(self.mode, depth)).await;
                    return Vec::new();
                }
                Err(e) => {
                    self.failures += 1;
                    warn!("fetch failed at {url}: {e}");
                    return Vec::new();
                }
            };

            let parsed = match opml::parse_outline_document(&body, &self.category, &subcategory) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("unparseable outline at {url}: {e}");
                    return Vec::new();
                }
            };

            let mut stations = parsed.stations;
            let limit = quota::max_subcategories(self.mode, &self.category, depth, self.factor);
            for link in parsed.links.iter().take(limit) {
                if !host_matches(&link.url, &self.directory_host) {
                    continue;
                }
                if visited.contains(&link.url) {
                    continue;
                }
                // Depth-1 link labels name the subcategory slice; deeper
                // nodes stay under their depth-1 ancestor's label.
                let child_subcategory = if depth == 0 {
                    sanitize_segment(&link.text)
                } else {
                    subcategory.clone()
                };
                let found = self
                    .walk(link.url.clone(), child_subcategory, depth + 1, visited.clone())
                    .await;
                if !found.is_empty() {
                    debug!(
                        "subcategory {} (depth {}): {} stations",
                        link.text,
                        depth + 1,
                        found.len()
                    );
                }
                stations.extend(found);
            }
            stations
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeFetcher {
        pages: HashMap<String, String>,
        errors: HashMap<String, u16>,
        hits: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn new() -> Self {
            Self {
                pages: HashMap::new(),
                errors: HashMap::new(),
                hits: Mutex::new(Vec::new()),
            }
        }

        fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }

        fn error(mut self, url: &str, status: u16) -> Self {
            self.errors.insert(url.to_string(), status);
            self
        }

        fn hit_count(&self) -> usize {
            self.hits.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl OutlineFetcher for FakeFetcher {
        async fn fetch(&self, url: &str, _timeout: Duration) -> Result<String> {
            self.hits.lock().unwrap().push(url.to_string());
            if let Some(status) = self.errors.get(url) {
                return match status {
                    403 => Err(AppError::AccessDenied(url.to_string())),
                    429 => Err(AppError::RateLimited(url.to_string())),
                    s => Err(AppError::Status {
                        status: *s,
                        url: url.to_string(),
                    }),
                };
            }
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::Status {
                    status: 404,
                    url: url.to_string(),
                })
        }
    }

    fn link_page(links: &[(&str, &str)]) -> String {
        let mut body = String::from("<opml><body>");
        for (text, url) in links {
            body.push_str(&format!(
                r#"<outline type="link" text="{text}" URL="{url}"/>"#
            ));
        }
        body.push_str("</body></opml>");
        body
    }

    fn audio_page(name: &str, url: &str) -> String {
        format!(
            r#"<opml><body><outline type="audio" text="{name}" URL="{url}"/></body></opml>"#
        )
    }

    const HOST: &str = "opml.radiotime.com";

    fn u(path: &str) -> String {
        format!("http://{HOST}/{path}")
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_terminates_with_each_node_fetched_once() {
        let fetcher = FakeFetcher::new()
            .page(&u("a"), &link_page(&[("B", &u("b"))]))
            .page(&u("b"), &link_page(&[("C", &u("c"))]))
            .page(&u("c"), &link_page(&[("A", &u("a"))]));
        let crawler = TreeCrawler::new(&fetcher, CrawlMode::Narrow, "talk", HOST);
        let outcome = crawler.collect(&u("a")).await;
        assert_eq!(fetcher.hit_count(), 3);
        assert_eq!(outcome.requests, 3);
        assert_eq!(outcome.failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_depth_zero_quota_limits_links_followed() {
        // Broad music: base 50 at depth 0, factor 2.0, quota 100.
        let links: Vec<(String, String)> = (0..120)
            .map(|i| (format!("Sub {i}"), u(&format!("sub/{i}"))))
            .collect();
        let refs: Vec<(&str, &str)> = links
            .iter()
            .map(|(t, l)| (t.as_str(), l.as_str()))
            .collect();
        let mut fetcher = FakeFetcher::new().page(&u("music"), &link_page(&refs));
        for (_, url) in &links {
            fetcher = fetcher.page(url, "<opml><body></body></opml>");
        }
        let crawler = TreeCrawler::new(&fetcher, CrawlMode::Broad, "music", HOST);
        let outcome = crawler.collect(&u("music")).await;
        assert_eq!(fetcher.hit_count(), 101);
        assert_eq!(outcome.failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreign_host_links_are_skipped() {
        let fetcher = FakeFetcher::new().page(
            &u("talk"),
            &link_page(&[("Elsewhere", "http://other.example.com/x")]),
        );
        let crawler = TreeCrawler::new(&fetcher, CrawlMode::Narrow, "talk", HOST);
        crawler.collect(&u("talk")).await;
        assert_eq!(fetcher.hit_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_branch_does_not_sink_siblings() {
        let fetcher = FakeFetcher::new()
            .page(
                &u("talk"),
                &link_page(&[("Bad", &u("bad")), ("Good", &u("good"))]),
            )
            .error(&u("bad"), 403)
            .page(&u("good"), &audio_page("Kept", "http://x.test/stream"));
        let crawler = TreeCrawler::new(&fetcher, CrawlMode::Narrow, "talk", HOST);
        let outcome = crawler.collect(&u("talk")).await;
        assert_eq!(outcome.stations.len(), 1);
        assert_eq!(outcome.stations[0].name, "Kept");
        assert_eq!(outcome.failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_ceiling_halts_traversal() {
        let fetcher = FakeFetcher::new().page(&u("talk"), "<opml><body></body></opml>");
        let mut crawler = TreeCrawler::new(&fetcher, CrawlMode::Narrow, "talk", HOST);
        crawler.failures = crawler.params.max_failures + 1;
        let outcome = crawler.collect(&u("talk")).await;
        assert_eq!(fetcher.hit_count(), 0);
        assert!(outcome.stations.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subcategory_label_applied_from_depth_one() {
        let fetcher = FakeFetcher::new()
            .page(&u("talk"), &link_page(&[("News &amp; Views", &u("news"))]))
            .page(
                &u("news"),
                &audio_page("Newsy", "http://x.test/stream"),
            );
        let crawler = TreeCrawler::new(&fetcher, CrawlMode::Narrow, "talk", HOST);
        let outcome = crawler.collect(&u("talk")).await;
        let placement = outcome.stations[0].placement.as_ref().unwrap();
        assert_eq!(placement.category, "talk");
        assert_eq!(placement.subcategory, "News___Views");
    }
}
