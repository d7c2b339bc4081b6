//! Storage module for sites, pages, lemmas and the inverted index
//!
//! All persistence goes through the [`Storage`] trait; [`SqliteStorage`] is
//! the production backend. Record structs mirror the four tables:
//! one row per configured site, one row per fetched page, one lemma row per
//! (site, lemma) with a page-frequency counter, and one index entry per
//! (page, lemma) with the occurrence-count rank.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;

use crate::SiteSearchError;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SiteSearchError> {
    SqliteStorage::new(path)
}

/// Indexing status of one site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteStatus {
    Indexing,
    Indexed,
    Failed,
}

impl SiteStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Indexing => "INDEXING",
            Self::Indexed => "INDEXED",
            Self::Failed => "FAILED",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "INDEXING" => Some(Self::Indexing),
            "INDEXED" => Some(Self::Indexed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One configured site as persisted
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub id: i64,
    /// Scheme + host, no trailing slash
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    /// RFC 3339 timestamp of the last status change or liveness update
    pub status_time: String,
    pub last_error: Option<String>,
}

/// One fetched page; failed fetches are recorded too (code 0, empty content)
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: i64,
    pub site_id: i64,
    /// Site-relative path including the leading slash
    pub path: String,
    pub code: u16,
    pub content: String,
}

/// One lemma on one site; frequency counts pages containing it
#[derive(Debug, Clone)]
pub struct LemmaRecord {
    pub id: i64,
    pub site_id: i64,
    pub lemma: String,
    pub frequency: i64,
}

/// One (page, lemma) posting with its occurrence-count weight
#[derive(Debug, Clone)]
pub struct IndexEntryRecord {
    pub id: i64,
    pub page_id: i64,
    pub lemma_id: i64,
    pub rank: f64,
}
