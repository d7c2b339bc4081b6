//! Indexing session: starting, stopping and observing crawl runs
//!
//! One [`IndexingSession`] is created per process. It guards against
//! overlapping runs, wipes stale site data before a full crawl, handles
//! single-page re-indexing and force-fails interrupted sites on stop.

use crate::api::{
    DetailedStatisticsItem, StatisticsData, StatisticsResponse, TotalStatistics,
};
use crate::config::{Config, SiteConfig};
use crate::crawler::{build_http_client, RateLimiter, SiteCrawl};
use crate::lemma::LemmaAnalyzer;
use crate::storage::{SiteStatus, SqliteStorage, Storage, StorageError};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Message recorded on sites whose crawl was interrupted by a stop request
const INTERRUPTED_MESSAGE: &str = "Indexing interrupted by user";

/// How many times [`IndexingSession::stop`] polls for a graceful shutdown
const STOP_POLL_TRIES: u32 = 20;
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Errors reported by indexing control operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Indexing is already running")]
    AlreadyRunning,

    #[error("Indexing is not running")]
    NotRunning,

    #[error("This page is outside the sites listed in the configuration")]
    UrlOutsideSites,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Coordinates crawl runs over the configured sites
pub struct IndexingSession {
    config: Arc<Config>,
    storage: Arc<Mutex<SqliteStorage>>,
    analyzer: Arc<LemmaAnalyzer>,
    running: AtomicBool,
    stop_flag: Arc<AtomicBool>,
}

impl IndexingSession {
    pub fn new(config: Arc<Config>, storage: Arc<Mutex<SqliteStorage>>) -> Self {
        Self {
            config,
            storage,
            analyzer: Arc::new(LemmaAnalyzer::new()),
            running: AtomicBool::new(false),
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True while a run owned by this process is active, or while any
    /// configured site is still persisted as INDEXING (e.g. after a crash)
    pub fn is_running(&self) -> bool {
        if self.running.load(Ordering::SeqCst) {
            return true;
        }
        let storage = self.storage.lock().unwrap();
        self.config.sites.iter().any(|site| {
            matches!(
                storage.find_site_by_url(&site.url),
                Ok(Some(record)) if record.status == SiteStatus::Indexing
            )
        })
    }

    /// Crawls and indexes every configured site from scratch
    ///
    /// Existing data for each site is deleted first, so a finished run
    /// fully replaces the previous index.
    pub async fn run_full_crawl(&self) -> Result<(), SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        let client = build_http_client(&self.config.crawl)?;

        self.stop_flag.store(false, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        let result = self.crawl_all_sites(client).await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn crawl_all_sites(&self, client: reqwest::Client) -> Result<(), SessionError> {
        let mut handles = Vec::with_capacity(self.config.sites.len());

        for site in &self.config.sites {
            let site_id = {
                let mut storage = self.storage.lock().unwrap();
                prepare_site(&mut storage, site)?
            };
            // Each site keeps its own last-request clock
            let limiter = Arc::new(RateLimiter::new(self.config.crawl.min_request_delay_ms));
            let crawl = SiteCrawl::new(
                site_id,
                site.url.clone(),
                self.config.crawl.clone(),
                client.clone(),
                limiter,
                Arc::clone(&self.storage),
                Arc::clone(&self.analyzer),
                Arc::clone(&self.stop_flag),
            );
            handles.push(tokio::spawn(crawl.run()));
        }

        for handle in handles {
            if handle.await.is_err() {
                tracing::error!("Site crawl task panicked");
            }
        }
        Ok(())
    }

    /// Re-indexes a single page given its absolute URL
    ///
    /// The URL must belong to one of the configured sites. An existing row
    /// for the page is removed first, with its lemma frequencies decremented.
    pub async fn run_url_crawl(&self, url: &str) -> Result<(), SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }

        let trimmed = url.trim();
        let (site, path) = resolve_page_url(&self.config.sites, trimmed)
            .ok_or(SessionError::UrlOutsideSites)?;
        let client = build_http_client(&self.config.crawl)?;

        self.stop_flag.store(false, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        let result = self.index_single_page(client, site, path).await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn index_single_page(
        &self,
        client: reqwest::Client,
        site: &SiteConfig,
        path: String,
    ) -> Result<(), SessionError> {
        let site_id = {
            let mut storage = self.storage.lock().unwrap();
            let record = match storage.find_site_by_url(&site.url)? {
                Some(record) => record,
                None => storage.create_site(&site.url, &site.name)?,
            };
            remove_existing_page(&mut storage, record.id, &path)?;
            storage.update_site_status(record.id, SiteStatus::Indexing, None)?;
            record.id
        };

        let limiter = Arc::new(RateLimiter::new(self.config.crawl.min_request_delay_ms));
        let crawl = SiteCrawl::new(
            site_id,
            site.url.clone(),
            self.config.crawl.clone(),
            client,
            limiter,
            Arc::clone(&self.storage),
            Arc::clone(&self.analyzer),
            Arc::clone(&self.stop_flag),
        );
        crawl.run_single(path).await;
        Ok(())
    }

    /// Requests a stop and waits for the active run to wind down
    ///
    /// After the grace period every site still persisted as INDEXING is
    /// force-failed, whether the run exited in time or not.
    pub async fn stop(&self) -> Result<(), SessionError> {
        if !self.is_running() {
            return Err(SessionError::NotRunning);
        }
        self.stop_flag.store(true, Ordering::SeqCst);

        for _ in 0..STOP_POLL_TRIES {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(STOP_POLL_INTERVAL).await;
        }

        let mut storage = self.storage.lock().unwrap();
        storage.update_sites_status_by_status(
            SiteStatus::Indexing,
            SiteStatus::Failed,
            Some(INTERRUPTED_MESSAGE),
        )?;
        tracing::info!("Indexing stopped");
        Ok(())
    }

    /// Collects total and per-site counters for the statistics report
    pub fn statistics(&self) -> Result<StatisticsResponse, SessionError> {
        let storage = self.storage.lock().unwrap();
        let mut detailed = Vec::with_capacity(self.config.sites.len());
        let mut total_pages = 0u64;
        let mut total_lemmas = 0u64;

        for site in &self.config.sites {
            let item = match storage.find_site_by_url(&site.url)? {
                Some(record) => {
                    let pages = storage.count_pages_by_site(record.id)?;
                    let lemmas = storage.count_lemmas_by_site(record.id)?;
                    total_pages += pages;
                    total_lemmas += lemmas;
                    DetailedStatisticsItem {
                        url: site.url.clone(),
                        name: site.name.clone(),
                        status: record.status.to_db_string().to_string(),
                        status_time: record.status_time,
                        error: record.last_error,
                        pages,
                        lemmas,
                    }
                }
                None => DetailedStatisticsItem {
                    url: site.url.clone(),
                    name: site.name.clone(),
                    status: SiteStatus::Failed.to_db_string().to_string(),
                    status_time: Utc::now().to_rfc3339(),
                    error: Some("Site has not been indexed yet".to_string()),
                    pages: 0,
                    lemmas: 0,
                },
            };
            detailed.push(item);
        }

        drop(storage);
        Ok(StatisticsResponse {
            result: true,
            statistics: StatisticsData {
                total: TotalStatistics {
                    sites: self.config.sites.len(),
                    pages: total_pages,
                    lemmas: total_lemmas,
                    indexing: self.is_running(),
                },
                detailed,
            },
        })
    }
}

/// Wipes any previous data for a configured site and inserts a fresh
/// INDEXING row, returning its id
fn prepare_site(storage: &mut SqliteStorage, site: &SiteConfig) -> Result<i64, StorageError> {
    if let Some(existing) = storage.find_site_by_url(&site.url)? {
        storage.delete_index_entries_by_site(existing.id)?;
        storage.delete_lemmas_by_site(existing.id)?;
        storage.delete_pages_by_site(existing.id)?;
        storage.delete_site(existing.id)?;
    }
    let record = storage.create_site(&site.url, &site.name)?;
    Ok(record.id)
}

/// Deletes a previously indexed page, decrementing the frequencies of the
/// lemmas it contributed to
fn remove_existing_page(
    storage: &mut SqliteStorage,
    site_id: i64,
    path: &str,
) -> Result<(), StorageError> {
    if let Some(page) = storage.find_page_by_site_and_path(site_id, path)? {
        let entries = storage.find_index_entries_by_page(page.id)?;
        let lemma_ids: Vec<i64> = entries.iter().map(|e| e.lemma_id).collect();
        storage.decrement_lemma_frequency(&lemma_ids)?;
        storage.delete_index_entries_by_page(page.id)?;
        storage.delete_page(page.id)?;
    }
    Ok(())
}

/// Matches an absolute page URL against the configured sites
///
/// Returns the owning site and the site-relative path. A URL equal to the
/// site root maps to "/". The prefix comparison is case-insensitive.
fn resolve_page_url<'a>(sites: &'a [SiteConfig], url: &str) -> Option<(&'a SiteConfig, String)> {
    for site in sites {
        if url.len() < site.url.len() {
            continue;
        }
        let (prefix, rest) = url.split_at(site.url.len());
        if !prefix.eq_ignore_ascii_case(&site.url) {
            continue;
        }
        if rest.is_empty() {
            return Some((site, "/".to_string()));
        }
        if rest.starts_with('/') {
            return Some((site, rest.to_string()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlConfig, DatabaseConfig};

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            crawl: CrawlConfig {
                user_agent: "TestAgent/1.0".to_string(),
                referrer: String::new(),
                min_request_delay_ms: 0,
                max_page_count: 100,
            },
            database: DatabaseConfig {
                path: ":memory:".to_string(),
            },
            sites: vec![SiteConfig {
                url: "https://www.example.ru".to_string(),
                name: "Example".to_string(),
            }],
        })
    }

    fn test_session() -> IndexingSession {
        let storage = SqliteStorage::new_in_memory().unwrap();
        IndexingSession::new(test_config(), Arc::new(Mutex::new(storage)))
    }

    #[test]
    fn test_not_running_initially() {
        assert!(!test_session().is_running());
    }

    #[test]
    fn test_running_when_site_persisted_indexing() {
        let session = test_session();
        {
            let mut storage = session.storage.lock().unwrap();
            storage
                .create_site("https://www.example.ru", "Example")
                .unwrap();
        }
        assert!(session.is_running());
    }

    #[tokio::test]
    async fn test_stop_without_active_run() {
        let session = test_session();
        assert!(matches!(
            session.stop().await,
            Err(SessionError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn test_url_crawl_rejects_foreign_url() {
        let session = test_session();
        let result = session.run_url_crawl("https://other.ru/page").await;
        assert!(matches!(result, Err(SessionError::UrlOutsideSites)));
    }

    #[test]
    fn test_resolve_page_url() {
        let sites = vec![SiteConfig {
            url: "https://www.example.ru".to_string(),
            name: "Example".to_string(),
        }];

        let (_, path) = resolve_page_url(&sites, "https://www.example.ru/news/1").unwrap();
        assert_eq!(path, "/news/1");

        let (_, path) = resolve_page_url(&sites, "https://www.example.ru").unwrap();
        assert_eq!(path, "/");

        let (_, path) = resolve_page_url(&sites, "HTTPS://WWW.EXAMPLE.RU/a").unwrap();
        assert_eq!(path, "/a");

        assert!(resolve_page_url(&sites, "https://www.example.ru.evil.com/x").is_none());
        assert!(resolve_page_url(&sites, "https://other.ru/").is_none());
    }

    #[test]
    fn test_prepare_site_wipes_previous_data() {
        let session = test_session();
        let site_cfg = &session.config.sites[0];
        let mut storage = session.storage.lock().unwrap();

        let old = storage.create_site(&site_cfg.url, &site_cfg.name).unwrap();
        let page = storage.create_page(old.id, "/", 200, "x").unwrap();
        let lemma = &storage
            .create_lemmas(old.id, &["море".to_string()])
            .unwrap()[0];
        storage.create_index_entries(&[(page, lemma.id, 1.0)]).unwrap();

        let new_id = prepare_site(&mut storage, site_cfg).unwrap();
        assert_ne!(new_id, old.id);
        assert_eq!(storage.count_pages_by_site(old.id).unwrap(), 0);
        assert_eq!(storage.count_lemmas_by_site(old.id).unwrap(), 0);
        let fresh = storage.find_site_by_url(&site_cfg.url).unwrap().unwrap();
        assert_eq!(fresh.id, new_id);
        assert_eq!(fresh.status, SiteStatus::Indexing);
    }

    #[test]
    fn test_statistics_for_unindexed_site() {
        let session = test_session();
        let stats = session.statistics().unwrap();
        assert_eq!(stats.statistics.total.sites, 1);
        assert_eq!(stats.statistics.total.pages, 0);
        assert!(!stats.statistics.total.indexing);
        assert_eq!(stats.statistics.detailed.len(), 1);
        assert_eq!(stats.statistics.detailed[0].status, "FAILED");
    }
}
