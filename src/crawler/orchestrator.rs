//! Per-site crawl orchestration
//!
//! One [`SiteCrawl`] owns the recursive traversal of a single site:
//! - Tracks visited paths and enforces the page ceiling
//! - Fans page processing out over spawned tasks and joins them
//! - Periodically refreshes the site's status timestamp
//! - Transitions the site to INDEXED or FAILED when traversal ends

use crate::config::CrawlConfig;
use crate::crawler::fetcher::{fetch_page, RateLimiter};
use crate::crawler::parser::extract_links;
use crate::indexer::write_page;
use crate::lemma::LemmaAnalyzer;
use crate::storage::{SiteStatus, SqliteStorage, Storage};
use reqwest::Client;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use url::Url;

/// Minimum interval between status timestamp refreshes
const STATUS_REFRESH_INTERVAL: Duration = Duration::from_millis(2000);

/// Crawl state and dependencies for one site
pub struct SiteCrawl {
    pub site_id: i64,
    /// Scheme + host, no trailing slash
    pub site_url: String,
    pub storage: Arc<Mutex<SqliteStorage>>,
    pub analyzer: Arc<LemmaAnalyzer>,
    crawl_config: CrawlConfig,
    client: Client,
    limiter: Arc<RateLimiter>,
    /// Session-wide stop request shared by every site crawl
    stop_flag: Arc<AtomicBool>,
    /// Set when a fatal write error aborts this site's crawl
    failed: AtomicBool,
    last_error: Mutex<Option<String>>,
    /// Lowercased visited paths; also enforces the page ceiling
    visited: Mutex<HashSet<String>>,
    last_status_refresh: Mutex<Instant>,
}

impl SiteCrawl {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        site_id: i64,
        site_url: String,
        crawl_config: CrawlConfig,
        client: Client,
        limiter: Arc<RateLimiter>,
        storage: Arc<Mutex<SqliteStorage>>,
        analyzer: Arc<LemmaAnalyzer>,
        stop_flag: Arc<AtomicBool>,
    ) -> Arc<Self> {
        Arc::new(Self {
            site_id,
            site_url,
            storage,
            analyzer,
            crawl_config,
            client,
            limiter,
            stop_flag,
            failed: AtomicBool::new(false),
            last_error: Mutex::new(None),
            visited: Mutex::new(HashSet::new()),
            last_status_refresh: Mutex::new(Instant::now()),
        })
    }

    /// Crawls the whole site starting from its root path
    pub async fn run(self: Arc<Self>) {
        tracing::info!("Starting crawl of {}", self.site_url);
        self.try_visit("/");
        Arc::clone(&self).process_page("/".to_string()).await;
        self.finish();
    }

    /// Fetches and indexes a single path without following links
    pub async fn run_single(self: Arc<Self>, path: String) {
        tracing::info!("Indexing single page {}{}", self.site_url, path);
        self.try_visit(&path);
        let url = self.page_url(&path);
        let outcome = fetch_page(&self.client, &self.limiter, &url).await;
        write_page(&self, &path, &outcome);
        self.finish();
    }

    /// True when a stop was requested or a fatal error aborted this site
    pub fn is_cancelled(&self) -> bool {
        self.stop_flag.load(Ordering::SeqCst) || self.failed.load(Ordering::SeqCst)
    }

    /// Aborts this site's crawl, keeping the first reported error message
    pub fn fail(&self, message: String) {
        tracing::error!("Crawl of {} failed: {}", self.site_url, message);
        let mut last_error = self.last_error.lock().unwrap();
        if last_error.is_none() {
            *last_error = Some(message);
        }
        self.failed.store(true, Ordering::SeqCst);
    }

    fn process_page(self: Arc<Self>, path: String) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            if self.is_cancelled() {
                return;
            }
            self.refresh_status_time();

            let url = self.page_url(&path);
            let outcome = fetch_page(&self.client, &self.limiter, &url).await;
            write_page(&self, &path, &outcome);

            if self.is_cancelled() || !outcome.is_success() {
                return;
            }

            let page_url = match Url::parse(&url) {
                Ok(u) => u,
                Err(e) => {
                    tracing::warn!("Unparseable page URL {}: {}", url, e);
                    return;
                }
            };

            let mut children = Vec::new();
            for link in extract_links(&outcome.body, &page_url, &self.site_url) {
                if self.is_cancelled() {
                    break;
                }
                if self.try_visit(&link) {
                    let child = Arc::clone(&self);
                    children.push(tokio::spawn(child.process_page(link)));
                }
            }

            for handle in children {
                if handle.await.is_err() {
                    tracing::warn!("Crawl task for {} panicked", self.site_url);
                }
            }
        })
    }

    /// Claims a path for processing
    ///
    /// Returns false when the path was already visited (compared in
    /// lowercase) or the page ceiling has been reached.
    fn try_visit(&self, path: &str) -> bool {
        let mut visited = self.visited.lock().unwrap();
        if visited.len() >= self.crawl_config.max_page_count {
            return false;
        }
        visited.insert(path.to_lowercase())
    }

    /// Refreshes the site's status timestamp, at most once per interval
    fn refresh_status_time(&self) {
        {
            let mut last = self.last_status_refresh.lock().unwrap();
            if last.elapsed() < STATUS_REFRESH_INTERVAL {
                return;
            }
            *last = Instant::now();
        }
        let mut storage = self.storage.lock().unwrap();
        if let Err(e) = storage.update_site_status_time(self.site_id) {
            tracing::warn!("Failed to refresh status time for {}: {}", self.site_url, e);
        }
    }

    fn page_url(&self, path: &str) -> String {
        format!("{}{}", self.site_url, path)
    }

    /// Records the final site status once traversal is over
    ///
    /// A user-requested stop leaves the status alone: the session that set
    /// the stop flag force-fails every INDEXING site in one pass.
    fn finish(&self) {
        if self.stop_flag.load(Ordering::SeqCst) {
            return;
        }
        let mut storage = self.storage.lock().unwrap();
        let result = if self.failed.load(Ordering::SeqCst) {
            let error = self.last_error.lock().unwrap().clone();
            storage.update_site_status(self.site_id, SiteStatus::Failed, error.as_deref())
        } else {
            storage.update_site_status(self.site_id, SiteStatus::Indexed, None)
        };
        match result {
            Ok(()) => tracing::info!("Finished crawl of {}", self.site_url),
            Err(e) => tracing::error!("Failed to record final status of {}: {}", self.site_url, e),
        }
    }
}
