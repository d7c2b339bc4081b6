//! Query execution over the inverted index
//!
//! A search runs in four stages:
//! 1. Validate the request and reduce the query to lemmas
//! 2. Resolve which sites participate
//! 3. Per site, resolve lemma rows, drop over-common ones and intersect
//!    postings starting from the rarest lemma
//! 4. Rank pages by relative score and render the requested window

use crate::api::SearchItem;
use crate::config::Config;
use crate::crawler::{extract_text, extract_title};
use crate::lemma::LemmaAnalyzer;
use crate::search::snippet::build_snippet;
use crate::storage::{SiteRecord, SiteStatus, SqliteStorage, Storage, StorageError};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Lemmas present on more than this share of a site's pages are dropped
/// from the query, unless a lemma is the only one left
const COMMON_LEMMA_PERCENT: i64 = 25;

/// Errors reported for invalid or unservable search requests
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search query is empty")]
    EmptyQuery,

    #[error("Result limit must be positive")]
    InvalidLimit,

    #[error("Result offset must not be negative")]
    InvalidOffset,

    #[error("The query contains no searchable words")]
    NoSearchableWords,

    #[error("Site {0} is not known to this service")]
    SiteNotFound(String),

    #[error("Indexing is still in progress, try again later")]
    IndexingInProgress,

    #[error("Site {0} has not been indexed yet")]
    SiteNotIndexed(String),

    #[error("No site has been indexed yet")]
    NothingIndexed,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Total hit count plus the rendered window of results
#[derive(Debug)]
pub struct SearchResults {
    pub count: usize,
    pub items: Vec<SearchItem>,
}

struct Candidate {
    page_id: i64,
    absolute: f64,
    site_url: String,
    site_name: String,
    // The lemmas that survived the over-common drop on this page's site;
    // snippets highlight these, not the full query
    lemmas: Arc<Vec<String>>,
}

/// Executes lemma searches against the persisted index
pub struct SearchEngine {
    config: Arc<Config>,
    storage: Arc<Mutex<SqliteStorage>>,
    analyzer: Arc<LemmaAnalyzer>,
}

impl SearchEngine {
    pub fn new(config: Arc<Config>, storage: Arc<Mutex<SqliteStorage>>) -> Self {
        Self {
            config,
            storage,
            analyzer: Arc::new(LemmaAnalyzer::new()),
        }
    }

    /// Runs one search request
    ///
    /// # Arguments
    ///
    /// * `query` - Free-text query
    /// * `site_filter` - Restricts the search to one site root URL
    /// * `offset` - Number of ranked results to skip
    /// * `limit` - Maximum number of results to render
    pub fn search(
        &self,
        query: &str,
        site_filter: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<SearchResults, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if limit < 1 {
            return Err(SearchError::InvalidLimit);
        }
        if offset < 0 {
            return Err(SearchError::InvalidOffset);
        }
        let query_lemmas: Vec<String> = self.analyzer.analyze(query).into_keys().collect();
        if query_lemmas.is_empty() {
            return Err(SearchError::NoSearchableWords);
        }

        let storage = self.storage.lock().unwrap();
        let sites = self.resolve_sites(&storage, site_filter)?;

        let mut candidates = Vec::new();
        for site in &sites {
            collect_site_candidates(&storage, site, &query_lemmas, &mut candidates)?;
        }
        if candidates.is_empty() {
            return Ok(SearchResults {
                count: 0,
                items: Vec::new(),
            });
        }

        let max_absolute = candidates
            .iter()
            .map(|c| c.absolute)
            .fold(f64::MIN, f64::max);
        let mut ranked: Vec<(Candidate, f64)> = candidates
            .into_iter()
            .map(|c| {
                let relevance = c.absolute / max_absolute;
                (c, relevance)
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.page_id.cmp(&b.0.page_id))
        });

        let count = ranked.len();
        let window: Vec<(Candidate, f64)> = ranked
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        let page_ids: Vec<i64> = window.iter().map(|(c, _)| c.page_id).collect();
        let pages: HashMap<i64, _> = storage
            .find_pages_by_ids(&page_ids)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut items = Vec::with_capacity(window.len());
        for (candidate, relevance) in window {
            let page = match pages.get(&candidate.page_id) {
                Some(page) => page,
                None => {
                    tracing::warn!("Ranked page {} no longer exists", candidate.page_id);
                    continue;
                }
            };
            let text = extract_text(&page.content);
            let snippet = build_snippet(&self.analyzer, &text, &candidate.lemmas);
            items.push(SearchItem {
                site: candidate.site_url,
                site_name: candidate.site_name,
                uri: page.path.clone(),
                title: extract_title(&page.content),
                snippet,
                relevance,
            });
        }

        Ok(SearchResults { count, items })
    }

    /// Resolves the set of sites the search runs over
    ///
    /// A scope that is still indexing is rejected; a scope with no lemma
    /// rows at all counts as not indexed. A FAILED site that got partway
    /// through a crawl keeps its partial index searchable.
    fn resolve_sites(
        &self,
        storage: &SqliteStorage,
        site_filter: Option<&str>,
    ) -> Result<Vec<SiteRecord>, SearchError> {
        match site_filter {
            Some(url) => {
                let record = storage
                    .find_site_by_url(url)?
                    .ok_or_else(|| SearchError::SiteNotFound(url.to_string()))?;
                if record.status == SiteStatus::Indexing {
                    return Err(SearchError::IndexingInProgress);
                }
                if storage.count_lemmas_by_site(record.id)? == 0 {
                    return Err(SearchError::SiteNotIndexed(url.to_string()));
                }
                Ok(vec![record])
            }
            None => {
                let mut records = Vec::new();
                for site in &self.config.sites {
                    if let Some(record) = storage.find_site_by_url(&site.url)? {
                        records.push(record);
                    }
                }
                if records.iter().any(|r| r.status == SiteStatus::Indexing) {
                    return Err(SearchError::IndexingInProgress);
                }
                if storage.count_lemmas()? == 0 {
                    return Err(SearchError::NothingIndexed);
                }
                Ok(records)
            }
        }
    }
}

/// Intersects postings for one site and appends the surviving pages
///
/// Sites missing any query lemma contribute nothing. Lemmas are processed
/// from rarest to most frequent, so the intersection shrinks fast; the
/// absolute score of a page is the sum of its ranks over the used lemmas.
fn collect_site_candidates(
    storage: &SqliteStorage,
    site: &SiteRecord,
    query_lemmas: &[String],
    out: &mut Vec<Candidate>,
) -> Result<(), SearchError> {
    let mut rows = storage.find_lemmas_by_site_and_set(site.id, query_lemmas, 0)?;
    if rows.len() < query_lemmas.len() {
        return Ok(());
    }
    rows.sort_by(|a, b| a.frequency.cmp(&b.frequency));

    let page_count = storage.count_pages_by_site(site.id)? as i64;
    let mut accepted = Vec::with_capacity(rows.len());
    for row in rows {
        let too_common = page_count > 0 && row.frequency * 100 / page_count > COMMON_LEMMA_PERCENT;
        if too_common && !accepted.is_empty() {
            tracing::debug!("Dropping over-common lemma '{}' on {}", row.lemma, site.url);
            continue;
        }
        accepted.push(row);
    }

    let mut scores: HashMap<i64, f64> = HashMap::new();
    for entry in storage.find_index_entries_by_lemma(accepted[0].id)? {
        scores.insert(entry.page_id, entry.rank);
    }
    for lemma in &accepted[1..] {
        if scores.is_empty() {
            break;
        }
        let page_ids: Vec<i64> = scores.keys().copied().collect();
        let mut next = HashMap::with_capacity(scores.len());
        for entry in storage.find_index_entries_by_pages_and_lemma(&page_ids, lemma.id)? {
            if let Some(previous) = scores.get(&entry.page_id) {
                next.insert(entry.page_id, previous + entry.rank);
            }
        }
        scores = next;
    }

    let accepted_lemmas = Arc::new(accepted.into_iter().map(|row| row.lemma).collect::<Vec<_>>());
    for (page_id, absolute) in scores {
        out.push(Candidate {
            page_id,
            absolute,
            site_url: site.url.clone(),
            site_name: site.name.clone(),
            lemmas: Arc::clone(&accepted_lemmas),
        });
    }
    Ok(())
}
