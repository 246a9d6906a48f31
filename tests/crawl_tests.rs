//! Integration tests for the site crawl
//!
//! These tests use wiremock to serve a small fashion site and run the
//! crawl engine against it end-to-end, with simulated time.

use chrono::{TimeZone, Utc};
use fashion_corpus::config::{Config, CrawlerConfig, FetcherConfig, SiteConfig};
use fashion_corpus::crawler::{CrawlEngine, Fetcher, FinishReason, ManualClock, Shutdown};
use fashion_corpus::state::MemoryCheckpointStore;
use fashion_corpus::storage::{SqliteStorage, Storage};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Article body well above both relevance gates
fn article_html(title: &str) -> String {
    let words = [
        "The", "designer", "showed", "a", "couture", "collection", "of", "silk", "and",
        "wool", "tailoring", "on", "the", "runway",
    ];
    let body = (0..300)
        .map(|i| words[i % words.len()])
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "<html><head><title>{title}</title></head><body>\
         <nav><a href=\"/\">Home</a></nav>\
         <article><h1>{title}</h1><p>{body}</p></article>\
         </body></html>"
    )
}

fn hub_html(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{href}\">{href}</a>"))
        .collect();
    format!("<html><head><title>Hub</title></head><body>{anchors}</body></html>")
}

async fn serve(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

/// The small site used by most tests:
///
/// `/` links to one hub and two articles; the hub links to one more
/// article, reachable only at depth 2.
async fn fashion_site() -> MockServer {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        hub_html(&["/hub/one", "/article/first", "/article/second"]),
    )
    .await;
    serve(&server, "/hub/one", hub_html(&["/article/deep"])).await;
    serve(&server, "/article/first", article_html("First look at the autumn runway")).await;
    serve(&server, "/article/second", article_html("Second thoughts on tailoring")).await;
    serve(&server, "/article/deep", article_html("A deep dive into couture")).await;
    server
}

fn site(server: &MockServer, name: &str, priority: u32) -> SiteConfig {
    SiteConfig::new(name, &server.uri(), &["/"], priority, &["/article/"])
}

fn test_config(sites: Vec<SiteConfig>, max_depth: u32, cap: u64) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth,
            max_articles_per_site: cap,
            crawl_delay_ms: 0,
            crawl_jitter_ms: 0,
            ..CrawlerConfig::default()
        },
        fetcher: FetcherConfig {
            max_retries: 1,
            ..FetcherConfig::default()
        },
        sites,
        ..Config::default()
    }
}

struct Harness {
    engine: CrawlEngine,
    checkpoints: MemoryCheckpointStore,
    clock: Arc<ManualClock>,
}

fn harness(config: Config) -> Harness {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap(),
    ));
    let shutdown = Shutdown::new();
    let fetcher =
        Fetcher::new(&config.fetcher, clock.clone(), shutdown.clone()).expect("client builds");
    let checkpoints = MemoryCheckpointStore::new();

    let engine = CrawlEngine::new(
        config,
        Arc::new(fetcher),
        Box::new(SqliteStorage::new_in_memory().expect("in-memory db")),
        Box::new(checkpoints.clone()),
        clock.clone(),
        shutdown,
    );

    Harness {
        engine,
        checkpoints,
        clock,
    }
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_articles_are_fetched_before_hubs() {
    let server = fashion_site().await;
    let site = site(&server, "Local", 1);
    let mut h = harness(test_config(vec![site.clone()], 1, 100));

    let report = h.engine.crawl_site(&site).await.unwrap();

    assert_eq!(report.reason, FinishReason::Exhausted);
    assert_eq!(report.articles, 2);
    assert_eq!(
        requested_paths(&server).await,
        vec!["/", "/article/first", "/article/second", "/hub/one"]
    );
}

#[tokio::test]
async fn test_articles_are_stored_with_titles() {
    let server = fashion_site().await;
    let site = site(&server, "Local", 1);
    let mut h = harness(test_config(vec![site.clone()], 1, 100));

    h.engine.crawl_site(&site).await.unwrap();

    let url = format!("{}/article/first", server.uri());
    let doc = h.engine.storage().get_document(&url).unwrap().unwrap();
    assert_eq!(doc.title, "First look at the autumn runway");
    assert_eq!(doc.source, "Local");
    assert!(doc.word_count >= 300);
    assert!(!doc.content.contains("Home"));

    // Hubs are crawled for links, never stored
    assert_eq!(h.engine.storage().count_documents().unwrap(), 2);
}

#[tokio::test]
async fn test_depth_bound_is_respected() {
    let server = fashion_site().await;
    let site = site(&server, "Local", 1);
    let mut h = harness(test_config(vec![site.clone()], 1, 100));

    h.engine.crawl_site(&site).await.unwrap();
    assert!(!requested_paths(&server).await.contains(&"/article/deep".to_string()));

    let server = fashion_site().await;
    let site = self::site(&server, "Local", 1);
    let mut h = harness(test_config(vec![site.clone()], 2, 100));

    let report = h.engine.crawl_site(&site).await.unwrap();
    assert!(requested_paths(&server).await.contains(&"/article/deep".to_string()));
    assert_eq!(report.articles, 3);
}

#[tokio::test]
async fn test_article_cap_stops_crawl() {
    let server = fashion_site().await;
    let site = site(&server, "Local", 1);
    let mut h = harness(test_config(vec![site.clone()], 1, 1));

    let report = h.engine.crawl_site(&site).await.unwrap();

    assert_eq!(report.reason, FinishReason::Capped);
    assert_eq!(report.articles, 1);
    assert_eq!(requested_paths(&server).await, vec!["/", "/article/first"]);
}

#[tokio::test]
async fn test_recrawl_inside_window_stores_nothing_new() {
    let server = fashion_site().await;
    let site = site(&server, "Local", 1);
    let mut h = harness(test_config(vec![site.clone()], 1, 100));

    let first = h.engine.crawl_site(&site).await.unwrap();
    let url = format!("{}/article/first", server.uri());
    let before = h.engine.storage().get_document(&url).unwrap().unwrap();

    h.clock.advance(Duration::from_secs(3600));
    let second = h.engine.crawl_site(&site).await.unwrap();
    let after = h.engine.storage().get_document(&url).unwrap().unwrap();

    assert_eq!(first.articles, 2);
    assert_eq!(second.articles, 0);
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_final_checkpoint_marks_completion() {
    let server = fashion_site().await;
    let site = site(&server, "Local", 1);
    let mut h = harness(test_config(vec![site.clone()], 1, 100));

    h.engine.crawl_site(&site).await.unwrap();

    let saved = h.checkpoints.snapshot().unwrap();
    let state = &saved.sources["Local"];
    assert!(state.completed);
    assert_eq!(state.articles_found, 2);
    assert_eq!(state.urls_visited, 4);
    assert_eq!(state.last_url, None);
    assert_eq!(state.depth, 1);
    assert!(state.last_updated.is_some());
}

#[tokio::test]
async fn test_periodic_checkpoint_on_interval() {
    let server = fashion_site().await;
    let site = site(&server, "Local", 1);
    let mut config = test_config(vec![site.clone()], 1, 100);
    config.crawler.checkpoint_interval = 1;
    let mut h = harness(config);

    h.engine.crawl_site(&site).await.unwrap();

    let saves: Vec<_> = h
        .checkpoints
        .history()
        .into_iter()
        .map(|file| file.sources["Local"].clone())
        .collect();
    assert_eq!(saves.len(), 3);

    // One save per stored article while the crawl runs, then the final one
    assert!(!saves[0].completed);
    assert_eq!(saves[0].articles_found, 1);
    assert_eq!(saves[0].last_url, Some(format!("{}/article/first", server.uri())));
    assert!(!saves[1].completed);
    assert_eq!(saves[1].articles_found, 2);
    assert_eq!(saves[1].last_url, Some(format!("{}/article/second", server.uri())));
    assert!(saves[2].completed);
    assert_eq!(saves[2].articles_found, 2);
}

#[tokio::test]
async fn test_no_periodic_checkpoint_below_interval() {
    let server = fashion_site().await;
    let site = site(&server, "Local", 1);
    let mut config = test_config(vec![site.clone()], 1, 100);
    config.crawler.checkpoint_interval = 20;
    let mut h = harness(config);

    h.engine.crawl_site(&site).await.unwrap();

    let history = h.checkpoints.history();
    assert_eq!(history.len(), 1);
    assert!(history[0].sources["Local"].completed);
}

#[tokio::test]
async fn test_failed_fetches_do_not_stop_crawl() {
    let server = MockServer::start().await;
    serve(&server, "/", hub_html(&["/article/missing", "/article/present"])).await;
    serve(&server, "/article/present", article_html("Present and accounted for")).await;

    let site = site(&server, "Local", 1);
    let mut h = harness(test_config(vec![site.clone()], 1, 100));

    let report = h.engine.crawl_site(&site).await.unwrap();
    assert_eq!(report.reason, FinishReason::Exhausted);
    assert_eq!(report.articles, 1);
}

#[tokio::test]
async fn test_off_topic_article_is_rejected() {
    let server = MockServer::start().await;
    let body = (0..300).map(|_| "lorem").collect::<Vec<_>>().join(" ");
    serve(&server, "/", hub_html(&["/article/offtopic"])).await;
    serve(
        &server,
        "/article/offtopic",
        format!("<html><body><article><p>{body}</p></article></body></html>"),
    )
    .await;

    let site = site(&server, "Local", 1);
    let mut h = harness(test_config(vec![site.clone()], 1, 100));

    let report = h.engine.crawl_site(&site).await.unwrap();
    assert_eq!(report.articles, 0);
    assert_eq!(h.engine.storage().count_documents().unwrap(), 0);
}

#[tokio::test]
async fn test_sites_crawled_by_priority_with_pause() {
    let server = fashion_site().await;
    let sites = vec![site(&server, "Later", 2), site(&server, "Sooner", 1)];
    let mut h = harness(test_config(sites, 0, 100));

    let reports = h.engine.crawl_all_sites().await;

    let names: Vec<_> = reports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Sooner", "Later"]);
    assert_eq!(
        h.clock
            .sleeps()
            .iter()
            .filter(|d| **d == Duration::from_secs(10))
            .count(),
        1
    );
}
