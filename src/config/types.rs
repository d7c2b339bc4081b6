use serde::Deserialize;

/// Main configuration structure for sitesearch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// User agent string sent with every page request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Referrer header sent with every page request
    #[serde(default)]
    pub referrer: String,

    /// Minimum delay between consecutive requests to one site (milliseconds)
    #[serde(rename = "min-request-delay-ms")]
    pub min_request_delay_ms: u64,

    /// Ceiling on the number of pages indexed per site in one run
    #[serde(rename = "max-page-count")]
    pub max_page_count: usize,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
}

/// One site to crawl and index
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Site address: scheme + host, no trailing slash (e.g. "https://www.example.ru")
    pub url: String,

    /// Display name shown in search results and statistics
    pub name: String,
}
