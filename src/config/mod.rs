//! Configuration loading and validation
//!
//! The configuration file is TOML: one [crawl] section with the bot identity
//! and crawl limits, one [database] section, and a [[sites]] array listing
//! the sites to index.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{Config, CrawlConfig, DatabaseConfig, SiteConfig};
pub use validation::validate;
