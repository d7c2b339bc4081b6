//! Crawler module for web page fetching and traversal
//!
//! This module contains the crawl machinery:
//! - HTTP fetching behind a shared minimum-delay rate limiter
//! - HTML parsing and same-site link extraction
//! - Recursive per-site traversal with a visited set and page ceiling

mod fetcher;
mod orchestrator;
mod parser;

pub use fetcher::{build_http_client, fetch_page, FetchOutcome, RateLimiter};
pub use orchestrator::SiteCrawl;
pub use parser::{extract_links, extract_text, extract_title};
