//! Sitesearch: a site-scoped search engine with its own crawler
//!
//! This crate crawls a configured list of web sites, extracts normalized
//! Russian word roots (lemmas) from page text, maintains an inverted
//! lemma -> page -> weight index in SQLite, and answers multi-term search
//! queries with relevance ranking and highlighted snippets.

pub mod api;
pub mod config;
pub mod crawler;
pub mod indexer;
pub mod lemma;
pub mod search;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for sitesearch operations
#[derive(Debug, Error)]
pub enum SiteSearchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Indexing error: {0}")]
    Indexing(#[from] indexer::SessionError),

    #[error("Search error: {0}")]
    Search(#[from] search::SearchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid site URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for sitesearch operations
pub type Result<T> = std::result::Result<T, SiteSearchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use indexer::IndexingSession;
pub use lemma::LemmaAnalyzer;
pub use search::SearchEngine;
pub use storage::{SiteStatus, SqliteStorage, Storage};
