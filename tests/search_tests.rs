//! End-to-end search tests: crawl a mock site, then query it

use sitesearch::config::{load_config, Config, CrawlConfig, DatabaseConfig, SiteConfig};
use sitesearch::indexer::IndexingSession;
use sitesearch::search::{SearchEngine, SearchError};
use sitesearch::storage::SqliteStorage;
use std::io::Write;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Arc<Config> {
    Arc::new(Config {
        crawl: CrawlConfig {
            user_agent: "SitesearchBot/1.0".to_string(),
            referrer: String::new(),
            min_request_delay_ms: 0,
            max_page_count: 100,
        },
        database: DatabaseConfig {
            path: ":memory:".to_string(),
        },
        sites: vec![SiteConfig {
            url: server.uri(),
            name: "Test Site".to_string(),
        }],
    })
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// Crawls the mock site and returns an engine over the same storage
async fn crawl_and_engine(server: &MockServer) -> SearchEngine {
    let config = config_for(server);
    let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
    let session = IndexingSession::new(Arc::clone(&config), Arc::clone(&storage));
    session.run_full_crawl().await.unwrap();
    SearchEngine::new(config, storage)
}

#[tokio::test]
async fn test_search_ranks_denser_page_higher() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Заповедник</title></head>
           <body>Дальневосточный леопард
             <a href="/dense">Еще</a>
           </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/dense",
        r#"<html><head><title>Леопарды</title></head>
           <body>Леопард видел леопарда. Леопарды повсюду.</body></html>"#,
    )
    .await;

    let engine = crawl_and_engine(&server).await;
    let results = engine.search("леопард", None, 0, 10).unwrap();

    assert_eq!(results.count, 2);
    assert_eq!(results.items[0].uri, "/dense");
    assert_eq!(results.items[0].relevance, 1.0);
    assert_eq!(results.items[0].title, "Леопарды");
    assert!(results.items[0].snippet.contains("<b>"));
    assert!(results.items[1].relevance < 1.0);
    assert_eq!(results.items[0].site, server.uri());
    assert_eq!(results.items[0].site_name, "Test Site");
}

#[tokio::test]
async fn test_search_matches_inflected_query_forms() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "<html><body>Старый леопард спит в тени</body></html>",
    )
    .await;

    let engine = crawl_and_engine(&server).await;
    // Plural query form must reach the page mentioning the singular
    let results = engine.search("леопарды", None, 0, 10).unwrap();
    assert_eq!(results.count, 1);
    assert!(results.items[0].snippet.contains("<b>леопард</b>"));
}

#[tokio::test]
async fn test_multi_word_query_requires_all_words() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body>Леопард в заповеднике <a href="/other">x</a></body></html>"#,
    )
    .await;
    mount_page(&server, "/other", "<html><body>Просто леопард</body></html>").await;

    let engine = crawl_and_engine(&server).await;
    let results = engine.search("леопард заповедник", None, 0, 10).unwrap();

    assert_eq!(results.count, 1);
    assert_eq!(results.items[0].uri, "/");
}

#[tokio::test]
async fn test_search_with_site_filter() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html><body>Синее море</body></html>").await;

    let engine = crawl_and_engine(&server).await;

    let site_url = server.uri();
    let filtered = engine
        .search("море", Some(site_url.as_str()), 0, 10)
        .unwrap();
    assert_eq!(filtered.count, 1);

    let unknown = engine.search("море", Some("https://unknown.ru"), 0, 10);
    assert!(matches!(unknown, Err(SearchError::SiteNotFound(_))));
}

#[tokio::test]
async fn test_site_filter_excludes_other_sites() {
    let server_a = MockServer::start().await;
    let server_b = MockServer::start().await;
    mount_page(&server_a, "/", "<html><body>Море на севере</body></html>").await;
    mount_page(&server_b, "/", "<html><body>Море на юге</body></html>").await;

    let config = Arc::new(Config {
        crawl: CrawlConfig {
            user_agent: "SitesearchBot/1.0".to_string(),
            referrer: String::new(),
            min_request_delay_ms: 0,
            max_page_count: 100,
        },
        database: DatabaseConfig {
            path: ":memory:".to_string(),
        },
        sites: vec![
            SiteConfig {
                url: server_a.uri(),
                name: "North".to_string(),
            },
            SiteConfig {
                url: server_b.uri(),
                name: "South".to_string(),
            },
        ],
    });
    let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
    let session = IndexingSession::new(Arc::clone(&config), Arc::clone(&storage));
    session.run_full_crawl().await.unwrap();
    let engine = SearchEngine::new(config, storage);

    let everywhere = engine.search("море", None, 0, 10).unwrap();
    assert_eq!(everywhere.count, 2);

    let site_a = server_a.uri();
    let only_a = engine.search("море", Some(site_a.as_str()), 0, 10).unwrap();
    assert_eq!(only_a.count, 1);
    assert!(only_a.items.iter().all(|item| item.site == site_a));
    assert_eq!(only_a.items[0].site_name, "North");
}

#[tokio::test]
async fn test_search_without_matches_returns_empty_result() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html><body>Синее море</body></html>").await;

    let engine = crawl_and_engine(&server).await;
    let results = engine.search("леопард", None, 0, 10).unwrap();
    assert_eq!(results.count, 0);
    assert!(results.items.is_empty());
}

#[tokio::test]
async fn test_statistics_after_crawl() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body>Море и корабль <a href="/a">a</a></body></html>"#,
    )
    .await;
    mount_page(&server, "/a", "<html><body>Берег</body></html>").await;

    let config = config_for(&server);
    let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
    let session = IndexingSession::new(Arc::clone(&config), Arc::clone(&storage));
    session.run_full_crawl().await.unwrap();

    let stats = session.statistics().unwrap();
    assert_eq!(stats.statistics.total.sites, 1);
    assert_eq!(stats.statistics.total.pages, 2);
    assert_eq!(stats.statistics.total.lemmas, 3);
    assert!(!stats.statistics.total.indexing);
    assert_eq!(stats.statistics.detailed[0].status, "INDEXED");
    assert_eq!(stats.statistics.detailed[0].pages, 2);
}

#[test]
fn test_config_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[crawl]
user-agent = "SitesearchBot/1.0"
referrer = "https://www.google.com"
min-request-delay-ms = 150
max-page-count = 500

[database]
path = "./sitesearch.db"

[[sites]]
url = "https://www.example.ru"
name = "Example"
"#
    )
    .unwrap();
    file.flush().unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.crawl.min_request_delay_ms, 150);
    assert_eq!(config.sites[0].url, "https://www.example.ru");
}
