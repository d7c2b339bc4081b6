//! Storage trait and error types

use crate::storage::{IndexEntryRecord, LemmaRecord, PageRecord, SiteRecord, SiteStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Site not found: {0}")]
    SiteNotFound(String),

    #[error("Page not found: {0}")]
    PageNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Defines every store operation the crawler, index writer, indexing session
/// and search engine consume. Callers are expected to serialize mutations
/// externally (the production handle is wrapped in a mutex).
pub trait Storage {
    // ===== Sites =====

    /// Inserts a fresh site row in INDEXING status with the current timestamp
    fn create_site(&mut self, url: &str, name: &str) -> StorageResult<SiteRecord>;

    /// Deletes one site row (pages/lemmas/index entries are removed separately)
    fn delete_site(&mut self, site_id: i64) -> StorageResult<()>;

    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>>;

    fn find_all_sites(&self) -> StorageResult<Vec<SiteRecord>>;

    fn find_sites_by_status(&self, status: SiteStatus) -> StorageResult<Vec<SiteRecord>>;

    fn count_sites_by_status(&self, status: SiteStatus) -> StorageResult<u64>;

    /// Bulk-moves every site in `old` status to `new`, stamping the given
    /// error message (used to force-fail sites on interrupted runs)
    fn update_sites_status_by_status(
        &mut self,
        old: SiteStatus,
        new: SiteStatus,
        error: Option<&str>,
    ) -> StorageResult<()>;

    /// Sets one site's status, refreshing the status timestamp
    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        error: Option<&str>,
    ) -> StorageResult<()>;

    /// Refreshes only the status timestamp (crawl liveness signal)
    fn update_site_status_time(&mut self, site_id: i64) -> StorageResult<()>;

    // ===== Pages =====

    /// Inserts a page row and returns its id
    fn create_page(
        &mut self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
    ) -> StorageResult<i64>;

    fn delete_page(&mut self, page_id: i64) -> StorageResult<()>;

    fn find_page_by_site_and_path(
        &self,
        site_id: i64,
        path: &str,
    ) -> StorageResult<Option<PageRecord>>;

    fn find_pages_by_ids(&self, page_ids: &[i64]) -> StorageResult<Vec<PageRecord>>;

    fn count_pages_by_site(&self, site_id: i64) -> StorageResult<u64>;

    fn delete_pages_by_site(&mut self, site_id: i64) -> StorageResult<()>;

    // ===== Lemmas =====

    /// Batch-inserts new lemma rows with frequency 1, returning them with ids
    fn create_lemmas(&mut self, site_id: i64, lemmas: &[String]) -> StorageResult<Vec<LemmaRecord>>;

    fn count_lemmas(&self) -> StorageResult<u64>;

    fn count_lemmas_by_site(&self, site_id: i64) -> StorageResult<u64>;

    /// Finds lemma rows across all sites matching the set with frequency
    /// strictly above `min_frequency`
    fn find_lemmas_by_set(
        &self,
        lemmas: &[String],
        min_frequency: i64,
    ) -> StorageResult<Vec<LemmaRecord>>;

    /// Site-scoped variant of [`Storage::find_lemmas_by_set`]
    fn find_lemmas_by_site_and_set(
        &self,
        site_id: i64,
        lemmas: &[String],
        min_frequency: i64,
    ) -> StorageResult<Vec<LemmaRecord>>;

    fn increment_lemma_frequency(&mut self, lemma_ids: &[i64]) -> StorageResult<()>;

    fn decrement_lemma_frequency(&mut self, lemma_ids: &[i64]) -> StorageResult<()>;

    fn delete_lemmas_by_site(&mut self, site_id: i64) -> StorageResult<()>;

    // ===== Index entries =====

    /// Batch-inserts (page, lemma, rank) postings
    fn create_index_entries(
        &mut self,
        entries: &[(i64, i64, f64)],
    ) -> StorageResult<()>;

    fn find_index_entries_by_page(&self, page_id: i64) -> StorageResult<Vec<IndexEntryRecord>>;

    fn find_index_entries_by_lemma(&self, lemma_id: i64) -> StorageResult<Vec<IndexEntryRecord>>;

    /// Postings for one lemma restricted to an existing page candidate set
    fn find_index_entries_by_pages_and_lemma(
        &self,
        page_ids: &[i64],
        lemma_id: i64,
    ) -> StorageResult<Vec<IndexEntryRecord>>;

    fn delete_index_entries_by_page(&mut self, page_id: i64) -> StorageResult<()>;

    /// Deletes every posting belonging to a site, cascading through its pages
    fn delete_index_entries_by_site(&mut self, site_id: i64) -> StorageResult<()>;
}
