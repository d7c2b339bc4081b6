//! Sitesearch main entry point
//!
//! Command-line interface for crawling, indexing and searching the
//! configured sites. Every command prints a JSON response, so the output
//! can be consumed by scripts as well as read by a human.

use clap::{Parser, Subcommand};
use sitesearch::api::{ResultResponse, SearchResponse};
use sitesearch::config::load_config_with_hash;
use sitesearch::indexer::IndexingSession;
use sitesearch::search::{SearchEngine, SearchError};
use sitesearch::storage::open_storage;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Sitesearch: a site-scoped search engine with its own crawler
#[derive(Parser, Debug)]
#[command(name = "sitesearch")]
#[command(version = "1.0.0")]
#[command(about = "Crawl configured sites and search them by Russian lemmas", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl and re-index every configured site from scratch
    Crawl,

    /// Re-index a single page by its absolute URL
    IndexUrl {
        /// Absolute URL of the page, within one of the configured sites
        url: String,
    },

    /// Search the index
    Search {
        /// Free-text query
        query: String,

        /// Restrict the search to one site root URL
        #[arg(long)]
        site: Option<String>,

        /// Number of ranked results to skip
        #[arg(long, default_value_t = 0)]
        offset: i64,

        /// Maximum number of results to print
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Print index statistics
    Stats,

    /// Validate the configuration and show what would be crawled
    DryRun,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if matches!(cli.command, Command::DryRun) {
        handle_dry_run(&config);
        return Ok(());
    }

    let storage = open_storage(Path::new(&config.database.path))?;
    let storage = Arc::new(Mutex::new(storage));
    let config = Arc::new(config);

    match cli.command {
        Command::Crawl => {
            let session = IndexingSession::new(Arc::clone(&config), storage);
            handle_crawl(&session).await?;
        }
        Command::IndexUrl { url } => {
            let session = IndexingSession::new(Arc::clone(&config), storage);
            let response = match session.run_url_crawl(&url).await {
                Ok(()) => ResultResponse::ok(),
                Err(e) => ResultResponse::failed(e.to_string()),
            };
            print_json(&response)?;
        }
        Command::Search {
            query,
            site,
            offset,
            limit,
        } => {
            let engine = SearchEngine::new(Arc::clone(&config), storage);
            let response = match engine.search(&query, site.as_deref(), offset, limit) {
                Ok(results) => SearchResponse::found(results.count, results.items),
                Err(SearchError::Storage(e)) => return Err(e.into()),
                Err(e) => SearchResponse::failed(e.to_string()),
            };
            print_json(&response)?;
        }
        Command::Stats => {
            let session = IndexingSession::new(Arc::clone(&config), storage);
            print_json(&session.statistics()?)?;
        }
        Command::DryRun => unreachable!(),
    }

    Ok(())
}

/// Runs the full crawl, stopping it gracefully on Ctrl-C
async fn handle_crawl(session: &IndexingSession) -> anyhow::Result<()> {
    let crawl = session.run_full_crawl();
    tokio::pin!(crawl);

    let response = tokio::select! {
        result = &mut crawl => match result {
            Ok(()) => ResultResponse::ok(),
            Err(e) => ResultResponse::failed(e.to_string()),
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupt received, stopping indexing");
            match session.stop().await {
                Ok(()) => ResultResponse::failed("Indexing interrupted by user"),
                Err(e) => ResultResponse::failed(e.to_string()),
            }
        }
    };

    print_json(&response)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitesearch=info,warn"),
            1 => EnvFilter::new("sitesearch=debug,info"),
            2 => EnvFilter::new("sitesearch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &sitesearch::config::Config) {
    println!("=== Sitesearch Dry Run ===\n");

    println!("Crawl Configuration:");
    println!("  User agent: {}", config.crawl.user_agent);
    println!("  Referrer: {}", config.crawl.referrer);
    println!(
        "  Min request delay: {}ms",
        config.crawl.min_request_delay_ms
    );
    println!("  Max pages per site: {}", config.crawl.max_page_count);

    println!("\nDatabase:");
    println!("  Path: {}", config.database.path);

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        println!("  - {} ({})", site.name, site.url);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} sites", config.sites.len());
}
