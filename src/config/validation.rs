//! Configuration validation
//!
//! Checks the loaded configuration before any crawl or search is allowed to
//! start: the site list must be non-empty, every site URL must be of the
//! form scheme + host with no path and no trailing slash, and the crawl
//! limits must be usable.

use crate::config::types::Config;
use crate::url::is_site_url_only;
use crate::ConfigError;

/// Validates a loaded configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.sites.is_empty() {
        return Err(ConfigError::Validation(
            "No sites configured: the [[sites]] list is empty".to_string(),
        ));
    }

    for site in &config.sites {
        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site {} has an empty display name",
                site.url
            )));
        }
        if !is_site_url_only(&site.url) {
            return Err(ConfigError::InvalidUrl(format!(
                "{} (expected scheme + host without a trailing slash, e.g. https://www.example.ru)",
                site.url
            )));
        }
    }

    if config.crawl.max_page_count == 0 {
        return Err(ConfigError::Validation(
            "max-page-count must be at least 1".to_string(),
        ));
    }

    if config.crawl.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{CrawlConfig, DatabaseConfig, SiteConfig};

    fn valid_config() -> Config {
        Config {
            crawl: CrawlConfig {
                user_agent: "SitesearchBot/1.0".to_string(),
                referrer: "https://www.google.com".to_string(),
                min_request_delay_ms: 500,
                max_page_count: 1000,
            },
            database: DatabaseConfig {
                path: "./sitesearch.db".to_string(),
            },
            sites: vec![SiteConfig {
                url: "https://www.example.ru".to_string(),
                name: "Example".to_string(),
            }],
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_site_list_rejected() {
        let mut config = valid_config();
        config.sites.clear();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_trailing_slash_rejected() {
        let mut config = valid_config();
        config.sites[0].url = "https://www.example.ru/".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_url_with_path_rejected() {
        let mut config = valid_config();
        config.sites[0].url = "https://www.example.ru/about".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let mut config = valid_config();
        config.sites[0].url = "ftp://www.example.ru".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_zero_page_count_rejected() {
        let mut config = valid_config();
        config.crawl.max_page_count = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut config = valid_config();
        config.sites[0].name = "  ".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
