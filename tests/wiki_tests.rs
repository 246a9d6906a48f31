//! Integration tests for the MediaWiki client and the category walk
//!
//! A wiremock server stands in for the MediaWiki Action API.

use chrono::{TimeZone, Utc};
use fashion_corpus::config::{Config, FetcherConfig, WikipediaConfig};
use fashion_corpus::crawler::{CrawlEngine, Fetcher, ManualClock, Shutdown, WIKIPEDIA_SOURCE};
use fashion_corpus::state::MemoryCheckpointStore;
use fashion_corpus::storage::{SqliteStorage, Storage};
use fashion_corpus::wiki::{EncyclopediaClient, MediaWikiClient, MemberKind};
use fashion_corpus::CorpusError;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "CorpusTest/0.1 (tests)";

fn fetcher() -> (Arc<Fetcher>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 11, 5, 14, 0, 0).unwrap(),
    ));
    let config = FetcherConfig {
        max_retries: 1,
        ..FetcherConfig::default()
    };
    let fetcher = Fetcher::new(&config, clock.clone(), Shutdown::new()).expect("client builds");
    (Arc::new(fetcher), clock)
}

fn api_url(server: &MockServer) -> String {
    format!("{}/w/api.php", server.uri())
}

fn client(server: &MockServer) -> MediaWikiClient {
    let (fetcher, _) = fetcher();
    MediaWikiClient::new(fetcher, &api_url(server), USER_AGENT).unwrap()
}

fn json_response(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/json")
}

fn fashion_text(topic: &str) -> String {
    let words = [topic, "is", "a", "garment", "in", "fashion", "made", "of", "silk", "or", "cotton"];
    (0..330).map(|i| words[i % words.len()]).collect::<Vec<_>>().join(" ")
}

async fn mount_members(server: &MockServer, category: &str, members: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("list", "categorymembers"))
        .and(query_param("cmtitle", category))
        .respond_with(json_response(json!({
            "batchcomplete": true,
            "query": {"categorymembers": members}
        })))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, title: &str, page_id: i64, text: String) {
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("prop", "extracts"))
        .and(query_param("titles", title))
        .respond_with(json_response(json!({
            "batchcomplete": true,
            "query": {"pages": [{"pageid": page_id, "ns": 0, "title": title, "extract": text}]}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_category_members_follow_continuation() {
    let server = MockServer::start().await;

    // Registered first so it wins over the unqualified listing below
    Mock::given(method("GET"))
        .and(query_param("cmcontinue", "page|next"))
        .respond_with(json_response(json!({
            "batchcomplete": true,
            "query": {"categorymembers": [
                {"pageid": 3, "ns": 0, "title": "Trench coat"}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "query"))
        .and(query_param("format", "json"))
        .and(query_param("formatversion", "2"))
        .and(query_param("cmtitle", "Category:Clothing"))
        .and(query_param("cmlimit", "500"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(json_response(json!({
            "continue": {"cmcontinue": "page|next", "continue": "-||"},
            "query": {"categorymembers": [
                {"pageid": 1, "ns": 0, "title": "Blazer"},
                {"pageid": 2, "ns": 14, "title": "Category:Coats"},
                {"pageid": 9, "ns": 6, "title": "File:Blazer.jpg"}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let members = client(&server).category_members("Category:Clothing").await.unwrap();

    let titles: Vec<_> = members.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Blazer", "Category:Coats", "File:Blazer.jpg", "Trench coat"]);
    assert_eq!(members[1].kind, MemberKind::Category);
    assert_eq!(members[2].kind, MemberKind::Other);
    assert_eq!(members[3].kind, MemberKind::Article);
}

#[tokio::test]
async fn test_page_returns_plain_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("explaintext", "1"))
        .and(query_param("redirects", "1"))
        .and(query_param("titles", "Little black dress"))
        .respond_with(json_response(json!({
            "query": {"pages": [{
                "pageid": 431,
                "ns": 0,
                "title": "Little black dress",
                "extract": "A little black dress is an evening or cocktail dress."
            }]}
        })))
        .mount(&server)
        .await;

    let page = client(&server).page("Little black dress").await.unwrap().unwrap();
    assert_eq!(page.page_id, 431);
    assert!(page.text.starts_with("A little black dress"));
}

#[tokio::test]
async fn test_missing_page_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(json_response(json!({
            "query": {"pages": [{"ns": 0, "title": "Nope", "missing": true}]}
        })))
        .mount(&server)
        .await;

    assert!(client(&server).page("Nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(json_response(json!({
            "error": {"code": "invalidtitle", "info": "Bad title \"\"."}
        })))
        .mount(&server)
        .await;

    let err = client(&server).category_members("").await.unwrap_err();
    assert!(matches!(err, CorpusError::Encyclopedia(msg) if msg.starts_with("invalidtitle")));
}

#[tokio::test]
async fn test_invalid_user_agent_is_rejected() {
    let (fetcher, _) = fetcher();
    let result = MediaWikiClient::new(fetcher, "http://localhost/w/api.php", "bad\nagent");
    assert!(matches!(result, Err(CorpusError::Config(_))));
}

#[tokio::test]
async fn test_wikipedia_walk_end_to_end() {
    let server = MockServer::start().await;
    mount_members(
        &server,
        "Category:Fashion",
        json!([
            {"pageid": 11, "ns": 0, "title": "Haute couture"},
            {"pageid": 20, "ns": 14, "title": "Category:Fashion designers"},
            {"pageid": 30, "ns": 14, "title": "Category:Fashion (disambiguation)"}
        ]),
    )
    .await;
    mount_members(
        &server,
        "Category:Fashion designers",
        json!([{"pageid": 12, "ns": 0, "title": "Coco Chanel"}]),
    )
    .await;
    mount_page(&server, "Haute couture", 11, fashion_text("couture")).await;
    mount_page(&server, "Coco Chanel", 12, fashion_text("Chanel")).await;

    let (fetcher, clock) = fetcher();
    let config = Config {
        wikipedia: WikipediaConfig {
            api_url: api_url(&server),
            user_agent: USER_AGENT.to_string(),
            root_categories: vec!["Category:Fashion".to_string()],
            ..WikipediaConfig::default()
        },
        ..Config::default()
    };
    let checkpoints = MemoryCheckpointStore::new();
    let mut engine = CrawlEngine::new(
        config,
        fetcher,
        Box::new(SqliteStorage::new_in_memory().unwrap()),
        Box::new(checkpoints.clone()),
        clock.clone(),
        Shutdown::new(),
    );

    let client = engine.wikipedia_client().unwrap();
    let report = engine.crawl_wikipedia(&client).await;

    assert_eq!(report.documents, 2);
    assert_eq!(report.categories_visited, 2);
    assert!(!report.interrupted);

    let doc = engine
        .storage()
        .get_document("https://en.wikipedia.org/wiki/Coco_Chanel")
        .unwrap()
        .unwrap();
    assert_eq!(doc.source, WIKIPEDIA_SOURCE);
    assert_eq!(doc.page_id, Some(12));
    assert_eq!(doc.title, "Coco Chanel");

    let saved = checkpoints.snapshot().unwrap();
    assert!(saved.sources[WIKIPEDIA_SOURCE].completed);
    assert_eq!(saved.sources[WIKIPEDIA_SOURCE].articles_found, 2);

    // 100ms after each of the four members handled
    let member_delays = clock
        .sleeps()
        .iter()
        .filter(|d| d.as_millis() == 100)
        .count();
    assert_eq!(member_delays, 4);
}
